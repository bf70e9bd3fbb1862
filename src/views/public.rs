//! Read-only content for the public pages.
//!
//! These selectors never write. They turn cached collection data into what a section shows.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::records;
use crate::models::{
    ActivityDraft, ActivityEntry, Event, EventDraft, EventStatus, Feedback, FeedbackDraft,
    NetworkMemberDraft, Project, ProjectDraft, ProjectStatus, Service, ServiceDraft, TeamMember,
    TeamMemberDraft,
};
use crate::query::{QueryState, QueryStatus};

/// Services shown when the service list cannot be loaded or is empty.
pub fn fallback_services() -> Vec<Service> {
    vec![
        Service {
            id: "fallback-web-development".to_string(),
            created_at: DateTime::<Utc>::default(),
            fields: ServiceDraft {
                title: "Web Development".to_string(),
                description: "Modern, responsive websites and web applications built to grow with your business."
                    .to_string(),
                features: vec![
                    "Responsive design".to_string(),
                    "Performance optimization".to_string(),
                    "SEO-friendly structure".to_string(),
                ],
                icon: "code".to_string(),
                sort_order: 0,
                active: true,
            },
        },
        Service {
            id: "fallback-logo-design".to_string(),
            created_at: DateTime::<Utc>::default(),
            fields: ServiceDraft {
                title: "Logo Design".to_string(),
                description: "Distinctive logos and brand marks that make your business recognizable."
                    .to_string(),
                features: vec![
                    "Custom concepts".to_string(),
                    "Brand guidelines".to_string(),
                    "All common file formats".to_string(),
                ],
                icon: "palette".to_string(),
                sort_order: 1,
                active: true,
            },
        },
    ]
}

/// Content of the services section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServicesSection {
    pub services: Vec<Service>,
    /// The hardcoded list is shown instead of service data.
    pub is_fallback: bool,
    pub is_loading: bool,
}

/// Active services by sort order, or the fallback list when nothing can be shown.
pub fn services_section(state: &QueryState) -> ServicesSection {
    if state.status == QueryStatus::Loading || state.status == QueryStatus::Idle {
        return ServicesSection {
            services: Vec::new(),
            is_fallback: false,
            is_loading: true,
        };
    }

    let mut services: Vec<Service> = records::<ServiceDraft>(state)
        .into_iter()
        .filter(|service| service.fields.active)
        .collect();
    services.sort_by_key(|service| service.fields.sort_order);

    if services.is_empty() {
        if state.is_error() {
            tracing::warn!("Services unavailable, showing fallback list");
        }
        return ServicesSection {
            services: fallback_services(),
            is_fallback: true,
            is_loading: false,
        };
    }

    ServicesSection {
        services,
        is_fallback: false,
        is_loading: false,
    }
}

/// Team members by display order, then name.
pub fn team_section(state: &QueryState) -> Vec<TeamMember> {
    let mut team = records::<TeamMemberDraft>(state);
    team.sort_by(|a, b| {
        a.fields
            .display_order
            .cmp(&b.fields.display_order)
            .then_with(|| a.fields.name.cmp(&b.fields.name))
    });
    team
}

pub fn featured_projects(state: &QueryState) -> Vec<Project> {
    records::<ProjectDraft>(state)
        .into_iter()
        .filter(|project| project.fields.featured)
        .collect()
}

pub fn projects_with_status(state: &QueryState, status: ProjectStatus) -> Vec<Project> {
    records::<ProjectDraft>(state)
        .into_iter()
        .filter(|project| project.fields.status == status)
        .collect()
}

/// Activity feed, newest first.
pub fn activity_feed(state: &QueryState, limit: Option<usize>) -> Vec<ActivityEntry> {
    let mut feed = records::<ActivityDraft>(state);
    feed.sort_by_key(|entry| Reverse(entry.created_at));
    if let Some(limit) = limit {
        feed.truncate(limit);
    }
    feed
}

/// Events split by status. Featured events come first in each group; upcoming and ongoing
/// events run soonest first, completed ones most recent first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventSchedule {
    pub upcoming: Vec<Event>,
    pub ongoing: Vec<Event>,
    pub completed: Vec<Event>,
}

pub fn event_schedule(state: &QueryState) -> EventSchedule {
    let mut schedule = EventSchedule::default();
    for event in records::<EventDraft>(state) {
        match event.fields.status {
            EventStatus::Upcoming => schedule.upcoming.push(event),
            EventStatus::Ongoing => schedule.ongoing.push(event),
            EventStatus::Completed => schedule.completed.push(event),
        }
    }

    schedule
        .upcoming
        .sort_by_key(|event| (!event.fields.featured, event.fields.date));
    schedule
        .ongoing
        .sort_by_key(|event| (!event.fields.featured, event.fields.date));
    schedule
        .completed
        .sort_by_key(|event| (!event.fields.featured, Reverse(event.fields.date)));
    schedule
}

/// Testimonials cleared for publication.
pub fn approved_feedback(state: &QueryState) -> Vec<Feedback> {
    records::<FeedbackDraft>(state)
        .into_iter()
        .filter(|feedback| feedback.fields.approved)
        .collect()
}

pub fn average_rating(feedback: &[Feedback]) -> Option<f32> {
    if feedback.is_empty() {
        return None;
    }
    let total: u32 = feedback.iter().map(|f| u32::from(f.fields.rating)).sum();
    Some(total as f32 / feedback.len() as f32)
}

/// Node group in the team network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeGroup {
    Team,
    Network,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkNode {
    pub id: String,
    pub label: String,
    pub group: NodeGroup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkLink {
    pub source: String,
    pub target: String,
}

/// Nodes and links fed to the force-directed team network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub links: Vec<NetworkLink>,
}

/// Team members and network contacts as one graph. Contacts link to the team member they
/// are connected to; links to unknown members are dropped.
pub fn team_network(team: &QueryState, network: &QueryState) -> NetworkGraph {
    let team = team_section(team);
    let contacts = records::<NetworkMemberDraft>(network);
    let team_ids: HashSet<&str> = team.iter().map(|member| member.id.as_str()).collect();

    let links = contacts
        .iter()
        .filter_map(|contact| {
            let target = contact.fields.connected_to.as_deref()?;
            team_ids.contains(target).then(|| NetworkLink {
                source: contact.id.clone(),
                target: target.to_string(),
            })
        })
        .collect();

    let nodes = team
        .iter()
        .map(|member| NetworkNode {
            id: member.id.clone(),
            label: member.fields.name.clone(),
            group: NodeGroup::Team,
        })
        .chain(contacts.iter().map(|contact| NetworkNode {
            id: contact.id.clone(),
            label: contact.fields.name.clone(),
            group: NodeGroup::Network,
        }))
        .collect();

    NetworkGraph { nodes, links }
}
