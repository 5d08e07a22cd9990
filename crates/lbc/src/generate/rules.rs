//! request, response and check rules
use super::{quote, Line};
use crate::ir::{Rule, RuleKind};

/// Parameters written as bare values instead of `key value`
const POSITIONAL: &[&str] = &["name", "value", "fmt", "expr", "key"];

/// Prefixes of tcp rule actions that name the ruleset
const TCP_RULESETS: &[&str] = &["connection", "content", "session", "inspect"];

/// Spell an action the way its rule family expects
///
/// Each family has its own convention and they are kept as they are:
/// - http rules turn every `_` into `-`
/// - tcp rules split a leading ruleset word off with a space, then turn the
///   remaining `_` into `-`
/// - check rules are written verbatim
pub(super) fn action(kind: RuleKind, action: &str) -> String {
    match kind {
        RuleKind::HttpRequest | RuleKind::HttpResponse | RuleKind::HttpAfterResponse => {
            action.replace('_', "-")
        }
        RuleKind::TcpRequest | RuleKind::TcpResponse => {
            for ruleset in TCP_RULESETS {
                if let Some(rest) = action
                    .strip_prefix(ruleset)
                    .and_then(|rest| rest.strip_prefix('_'))
                {
                    return format!("{ruleset} {}", rest.replace('_', "-"));
                }
            }
            action.replace('_', "-")
        }
        RuleKind::HttpCheck | RuleKind::TcpCheck => action.to_string(),
    }
}

pub(super) fn rule(rule: &Rule) -> Line {
    let mut line = Line::new(rule.kind.keyword()).word(action(rule.kind, &rule.action));

    for (key, value) in &rule.params {
        if !POSITIONAL.contains(&key.as_str()) {
            line = line.word(key);
        }
        line = line.word(quote(value));
    }

    line.condition(&rule.condition)
}

#[cfg(test)]
mod test {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn make(kind: RuleKind, action: &str, params: &[(&str, &str)], condition: Option<&str>) -> Rule {
        Rule {
            kind,
            action: action.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<IndexMap<_, _>>(),
            condition: condition.map(str::to_string),
        }
    }

    #[test]
    fn http_actions_use_dashes() {
        assert_eq!(action(RuleKind::HttpRequest, "set_header"), "set-header");
        assert_eq!(action(RuleKind::HttpResponse, "del_header"), "del-header");
        assert_eq!(
            action(RuleKind::HttpAfterResponse, "set_status"),
            "set-status"
        );
    }

    #[test]
    fn tcp_actions_split_the_ruleset() {
        assert_eq!(
            action(RuleKind::TcpRequest, "content_track_sc0"),
            "content track-sc0"
        );
        assert_eq!(
            action(RuleKind::TcpRequest, "inspect_delay"),
            "inspect delay"
        );
        assert_eq!(
            action(RuleKind::TcpRequest, "connection_reject"),
            "connection reject"
        );
        assert_eq!(
            action(RuleKind::TcpResponse, "content_accept"),
            "content accept"
        );
        assert_eq!(action(RuleKind::TcpRequest, "contents_x"), "contents-x");
    }

    #[test]
    fn check_actions_are_verbatim() {
        assert_eq!(action(RuleKind::HttpCheck, "send_state"), "send_state");
        assert_eq!(action(RuleKind::TcpCheck, "expect"), "expect");
    }

    #[test]
    fn positional_and_named_params() {
        let set_header = make(
            RuleKind::HttpRequest,
            "set_header",
            &[("name", "X-Forwarded-Proto"), ("value", "https")],
            Some("{ ssl_fc }"),
        );
        assert_eq!(
            rule(&set_header).to_string(),
            "http-request set-header X-Forwarded-Proto https if { ssl_fc }"
        );

        let deny = make(
            RuleKind::HttpRequest,
            "deny",
            &[("deny_status", "403")],
            Some("unless allowed"),
        );
        assert_eq!(
            rule(&deny).to_string(),
            "http-request deny deny_status 403 unless allowed"
        );

        let add_header = make(
            RuleKind::HttpRequest,
            "add_header",
            &[("name", "X-Who"), ("fmt", "%[src] %[dst]")],
            None,
        );
        assert_eq!(
            rule(&add_header).to_string(),
            "http-request add-header X-Who \"%[src] %[dst]\""
        );
    }
}
