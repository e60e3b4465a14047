//! Round-robin ticket assignment.

use support_core::actor::Actor;
use support_core::error::SupportResult;
use support_core::models::assignment_rule::AssignmentRule;
use support_core::models::ticket::{Ticket, UpdateTicket};
use support_core::repository::{
    AssignmentRuleRepository, Repositories, TeamRepository, TicketRepository,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Rewrite the team's rule with its currently enabled members.
pub(crate) async fn sync_team_rule<R: Repositories>(
    repos: &R,
    support_provider: &str,
    team_id: Uuid,
) -> SupportResult<AssignmentRule> {
    let users: Vec<String> = repos
        .teams()
        .list_members(team_id)
        .await?
        .into_iter()
        .filter(|m| !m.disabled)
        .map(|m| m.email)
        .collect();

    repos
        .assignment_rules()
        .upsert_for_team(support_provider, team_id, users, &Actor::System)
        .await
}

/// Assign a freshly created ticket to the next agent of its provider's
/// rule. Tickets without a provider or rule are returned untouched.
pub(crate) async fn auto_assign<R: Repositories>(repos: &R, ticket: Ticket) -> SupportResult<Ticket> {
    let Some(provider) = ticket.support_provider.as_deref() else {
        return Ok(ticket);
    };
    let Some(rule) = repos.assignment_rules().find_for_provider(provider).await? else {
        debug!(provider, "No assignment rule");
        return Ok(ticket);
    };
    let Some(user) = rule.next_user().map(str::to_string) else {
        return Ok(ticket);
    };

    let ticket = repos
        .tickets()
        .update(
            ticket.id,
            UpdateTicket {
                assignees: Some(vec![user.clone()]),
                ..Default::default()
            },
            &Actor::System,
        )
        .await?;
    repos
        .assignment_rules()
        .record_assignment(&rule.name, &user, &Actor::System)
        .await?;

    info!(ticket_id = %ticket.id, assignee = %user, rule = %rule.name, "Ticket auto-assigned");
    Ok(ticket)
}
