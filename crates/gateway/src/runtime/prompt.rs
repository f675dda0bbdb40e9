//! Instructions sent to the decision-maker.

use tt_domain::ticket::Ticket;

pub const SYSTEM_PROMPT: &str = "\
You are a support triage agent. For every ticket:
1. Gather context first: always look up the customer profile, then search the knowledge base for the issue.
2. Decide urgency from the customer's plan (Enterprise, Pro or Free) and the severity of the issue. Treat as Critical: \
an Enterprise customer hit by an outage or error 500, outages affecting many users or a whole region, \
suspected data breaches or security issues, and incidents that put revenue at risk (for example \"the deal will be lost\").
3. If urgency is Critical, call report_critical_incident BEFORE giving your final answer. \
If the knowledge base had nothing relevant (kb_found=false), set suggested_action to Escalate to Human; do not guess a fix.
4. Finish with a single JSON object and nothing else, with exactly these keys:
   urgency (Critical | High | Medium | Low), sentiment (free text), \
category (Billing | Technical | Feature Request | General), summary, \
suggested_action (Auto-respond | Route to Specialist | Escalate to Human), draft_response.";

pub const REPAIR_INSTRUCTION: &str = "\
Your previous reply was not a valid triage result. Reply again with ONLY the JSON object \
containing urgency, sentiment, category, summary, suggested_action and draft_response, \
using exactly the allowed values.";

pub const INCIDENT_REMINDER: &str = "\
You classified this ticket as Critical but no incident has been recorded. \
Call report_critical_incident now, then repeat your final JSON answer.";

/// The user turn describing one ticket.
pub fn ticket_prompt(ticket: &Ticket) -> String {
    let mut out = format!(
        "Ticket ID: {}\nCustomer ID: {}\nMessages:\n",
        ticket.ticket_id, ticket.customer_id
    );
    if ticket.messages.is_empty() {
        out.push_str("(no messages)\n");
    }
    for (i, msg) in ticket.messages.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, msg.trim()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_prompt_numbers_messages() {
        let t = Ticket {
            ticket_id: "T-9".into(),
            customer_id: "CUST_002".into(),
            messages: vec!["Site is down".into(), " Still down! ".into()],
        };
        let p = ticket_prompt(&t);
        assert!(p.contains("Customer ID: CUST_002"));
        assert!(p.contains("1. Site is down\n2. Still down!\n"));
    }

    #[test]
    fn system_prompt_carries_escalation_rules() {
        assert!(SYSTEM_PROMPT.contains("kb_found=false"));
        assert!(SYSTEM_PROMPT.contains("revenue at risk"));
        assert!(SYSTEM_PROMPT.contains("report_critical_incident BEFORE"));
    }

    #[test]
    fn ticket_prompt_marks_empty_thread() {
        let t = Ticket { ticket_id: "T".into(), customer_id: "C".into(), messages: vec![] };
        assert!(ticket_prompt(&t).contains("(no messages)"));
    }
}
