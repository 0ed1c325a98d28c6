use super::upsert_by;
use crate::store::events::TeamEvent;
use crate::store::state::TeamState;

pub fn reduce(state: &TeamState, event: &TeamEvent) -> TeamState {
    match event {
        TeamEvent::Started => TeamState {
            loading: true,
            error: None,
            ..state.clone()
        },
        TeamEvent::Failed { message } => TeamState {
            loading: false,
            error: Some(message.clone()),
            ..state.clone()
        },
        TeamEvent::Settled => TeamState {
            loading: false,
            ..state.clone()
        },
        TeamEvent::TeamsLoaded { teams } => TeamState {
            teams: teams
                .iter()
                .cloned()
                .map(|t| t.with_owner_as_member())
                .collect(),
            loading: false,
            error: None,
            ..state.clone()
        },
        TeamEvent::TeamCreated { team } => {
            let mut next = TeamState {
                loading: false,
                error: None,
                ..state.clone()
            };
            upsert_by(&mut next.teams, team.clone().with_owner_as_member(), |t| t.id);
            next
        }
        TeamEvent::MembersLoaded { team_id, members } => {
            let mut next = TeamState {
                loading: false,
                error: None,
                ..state.clone()
            };
            next.members_by_team.insert(*team_id, members.clone());
            next
        }
        TeamEvent::MemberRemoved { team_id, user_id } => {
            let mut next = TeamState {
                loading: false,
                error: None,
                ..state.clone()
            };
            if let Some(members) = next.members_by_team.get_mut(team_id) {
                members.retain(|m| m.id != *user_id);
            }
            if let Some(team) = next.teams.iter_mut().find(|t| t.id == *team_id) {
                team.members.retain(|m| m.id != *user_id);
            }
            next
        }
        TeamEvent::Cleared => TeamState::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Team, UserSummary};

    fn user(id: i64) -> UserSummary {
        UserSummary {
            id,
            email: String::new(),
            username: format!("user{}", id),
            first_name: String::new(),
            last_name: String::new(),
            avatar_url: None,
        }
    }

    #[test]
    fn test_members_keyed_by_team_do_not_clobber_siblings() {
        let state = reduce(
            &TeamState::default(),
            &TeamEvent::MembersLoaded {
                team_id: 1,
                members: vec![user(1), user(2)],
            },
        );
        let state = reduce(
            &state,
            &TeamEvent::MembersLoaded {
                team_id: 2,
                members: vec![user(3)],
            },
        );
        assert_eq!(state.members_by_team[&1].len(), 2);
        assert_eq!(state.members_by_team[&2].len(), 1);
    }

    #[test]
    fn test_member_removed_everywhere() {
        let team = Team {
            id: 1,
            name: "A".to_string(),
            owner: Some(user(1)),
            members: vec![user(2)],
        };
        let state = reduce(&TeamState::default(), &TeamEvent::TeamCreated { team });
        assert_eq!(state.teams[0].members.len(), 2);

        let state = reduce(
            &state,
            &TeamEvent::MembersLoaded {
                team_id: 1,
                members: vec![user(1), user(2)],
            },
        );
        let state = reduce(
            &state,
            &TeamEvent::MemberRemoved {
                team_id: 1,
                user_id: 2,
            },
        );
        assert_eq!(state.members_by_team[&1], vec![user(1)]);
        assert_eq!(state.teams[0].members, vec![user(1)]);
    }
}
