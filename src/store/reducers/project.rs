use super::upsert_by;
use crate::store::events::ProjectEvent;
use crate::store::state::ProjectState;

pub fn reduce(state: &ProjectState, event: &ProjectEvent) -> ProjectState {
    match event {
        ProjectEvent::Started => ProjectState {
            loading: true,
            error: None,
            ..state.clone()
        },
        ProjectEvent::Failed { message } => ProjectState {
            loading: false,
            error: Some(message.clone()),
            ..state.clone()
        },
        ProjectEvent::Settled => ProjectState {
            loading: false,
            ..state.clone()
        },
        ProjectEvent::ProjectsLoaded { team_id, projects } => {
            let mut next = ProjectState {
                loading: false,
                error: None,
                ..state.clone()
            };
            next.projects_by_team.insert(*team_id, projects.clone());
            next
        }
        ProjectEvent::ProjectCreated { project } => {
            let mut next = ProjectState {
                loading: false,
                error: None,
                ..state.clone()
            };
            let projects = next.projects_by_team.entry(project.team_id).or_default();
            upsert_by(projects, project.clone(), |p| p.id);
            next
        }
        ProjectEvent::MembersLoaded {
            project_id,
            members,
        } => {
            let mut next = ProjectState {
                loading: false,
                error: None,
                ..state.clone()
            };
            next.members_by_project.insert(*project_id, members.clone());
            next
        }
        ProjectEvent::MemberRemoved {
            project_id,
            user_id,
        } => {
            let mut next = ProjectState {
                loading: false,
                error: None,
                ..state.clone()
            };
            if let Some(members) = next.members_by_project.get_mut(project_id) {
                members.retain(|m| m.id != *user_id);
            }
            for project in next
                .projects_by_team
                .values_mut()
                .flat_map(|projects| projects.iter_mut())
                .filter(|p| p.id == *project_id)
            {
                project.members.retain(|m| m.id != *user_id);
            }
            next
        }
        ProjectEvent::Cleared => ProjectState::default(),
    }
}
