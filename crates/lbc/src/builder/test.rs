use super::*;
use crate::parse_tree::{Iterable, LoopNode, SectionNode};
use pretty_assertions::assert_eq;

fn section(kind: &str, name: Option<&str>, children: Vec<Child>) -> Item {
    Item::Section(SectionNode {
        kind: kind.to_string(),
        name: name.map(str::to_string),
        children,
        position: None,
    })
}

fn pair(key: &str, value: impl Into<Value>) -> Child {
    Child::Pair {
        key: key.to_string(),
        value: Expr::Literal(value.into()),
        position: None,
    }
}

fn document(items: Vec<Item>) -> Document {
    Document { items }
}

#[test]
fn proxy_sections_get_defaults() {
    let root = build(&document(vec![
        section("frontend", Some("web"), vec![pair("default_backend", "app")]),
        section("backend", Some("app"), vec![]),
    ]))
    .unwrap();

    assert_eq!(root.frontends[0].common.mode, Some(Mode::Http));
    assert_eq!(root.frontends[0].front.default_backend.as_deref(), Some("app"));
    assert_eq!(root.backends[0].common.mode, Some(Mode::Http));
    assert_eq!(root.backends[0].back.balance, Some(Balance::RoundRobin));
}

#[test]
fn explicit_mode_and_balance_win() {
    let root = build(&document(vec![section(
        "backend",
        Some("db"),
        vec![pair("mode", "tcp"), pair("balance", "leastconn")],
    )]))
    .unwrap();

    assert_eq!(root.backends[0].common.mode, Some(Mode::Tcp));
    assert_eq!(root.backends[0].back.balance, Some(Balance::LeastConn));
}

#[test]
fn servers_keep_unset_params_empty() {
    let server = ObjectNode::new("server")
        .label("web1")
        .pair("address", "10.0.0.1")
        .pair("port", 8080i64)
        .pair("check", true)
        .spread("base");

    let root = build(&document(vec![section(
        "backend",
        Some("app"),
        vec![server.into()],
    )]))
    .unwrap();

    let server = &root.backends[0].back.servers[0];
    assert_eq!(server.name, "web1");
    assert_eq!(server.port, Some(8080));
    assert_eq!(server.params.check, Some(true));
    assert_eq!(server.params.inter, None);
    assert_eq!(server.templates, vec!["base"]);
}

#[test]
fn health_check_defaults_rise_and_fall() {
    let check = ObjectNode::new("health_check")
        .pair("type", "http")
        .pair("uri", "/health");

    let root = build(&document(vec![section(
        "backend",
        Some("app"),
        vec![check.into()],
    )]))
    .unwrap();

    let check = root.backends[0].back.health_check.as_ref().unwrap();
    assert_eq!(check.kind, CheckKind::Http);
    assert_eq!(check.uri.as_deref(), Some("/health"));
    assert_eq!((check.rise, check.fall), (2, 3));
}

#[test]
fn loops_are_stored_not_expanded() {
    let body = ObjectNode::new("server")
        .label("web${i}")
        .pair("address", "10.0.0.${i}");
    let node = LoopNode {
        variable: "i".to_string(),
        iterable: Iterable::Range {
            start: Expr::Literal(1i64.into()),
            end: Expr::Literal("${count}".into()),
        },
        body: vec![body],
        position: None,
    };

    let root = build(&document(vec![section(
        "backend",
        Some("app"),
        vec![node.into()],
    )]))
    .unwrap();

    let back = &root.backends[0].back;
    assert!(back.servers.is_empty());
    assert_eq!(back.loops.len(), 1);
    assert_eq!(
        back.loops[0].iterable,
        LoopIterable::Range {
            start: Bound::Integer(1),
            end: Bound::Expr("${count}".to_string()),
        }
    );
    assert_eq!(back.loops[0].body[0].address, "10.0.0.${i}");
}

#[test]
fn rules_keep_parameter_order() {
    let rule = ObjectNode::new("http_request")
        .label("set_header")
        .pair("name", "X-Forwarded-Proto")
        .pair("value", "https")
        .pair("condition", "{ ssl_fc }");

    let root = build(&document(vec![section(
        "frontend",
        Some("web"),
        vec![rule.into()],
    )]))
    .unwrap();

    let rule = &root.frontends[0].common.rules.http_request[0];
    assert_eq!(rule.action, "set_header");
    assert_eq!(
        rule.params.keys().collect::<Vec<_>>(),
        vec!["name", "value"]
    );
    assert_eq!(rule.condition.as_deref(), Some("{ ssl_fc }"));
}

#[test]
fn templates_keep_their_params() {
    let root = build(&document(vec![Item::Template {
        name: "base".to_string(),
        children: vec![pair("kind", "server"), pair("check", true), pair("inter", "3s")],
        position: None,
    }]))
    .unwrap();

    let template = &root.templates["base"];
    assert_eq!(template.kind, TemplateKind::Server);
    assert_eq!(
        template.params.keys().collect::<Vec<_>>(),
        vec!["check", "inter"]
    );
}

#[test]
fn bind_in_backend_is_misplaced() {
    let bind = ObjectNode::new("bind").label("*:80");

    let err = build(&document(vec![section(
        "backend",
        Some("app"),
        vec![bind.into()],
    )]))
    .unwrap_err();

    assert_eq!(
        err,
        BuildError::Misplaced {
            directive: "bind".to_string(),
            section: "backend `app`".to_string(),
            at: At(None),
        }
    );
}

#[test]
fn servers_are_rejected_in_defaults() {
    let server = ObjectNode::new("server")
        .label("web1")
        .pair("address", "10.0.0.1");

    let err = build(&document(vec![section("defaults", None, vec![server.into()])])).unwrap_err();

    assert!(matches!(err, BuildError::Misplaced { directive, .. } if directive == "server"));
}

#[test]
fn unknown_server_key_is_reported() {
    let server = ObjectNode::new("server")
        .label("web1")
        .pair("address", "10.0.0.1")
        .pair("wieght", 10i64);

    let err = build(&document(vec![section(
        "backend",
        Some("app"),
        vec![server.into()],
    )]))
    .unwrap_err();

    assert_eq!(err.to_string(), "unknown key `wieght` in `server`");
}

#[test]
fn server_name_from_field() {
    let server = ObjectNode::new("server")
        .pair("name", "api${i}")
        .pair("address", "10.0.1.${i}");

    let root = build(&document(vec![section(
        "backend",
        Some("app"),
        vec![server.into()],
    )]))
    .unwrap();

    assert_eq!(root.backends[0].back.servers[0].name, "api${i}");
}

#[test]
fn server_name_label_or_field() {
    let both = ObjectNode::new("server")
        .label("web1")
        .pair("name", "web2")
        .pair("address", "10.0.0.1");
    let neither = ObjectNode::new("server").pair("address", "10.0.0.1");

    let err = build(&document(vec![section("backend", Some("app"), vec![both.into()])])).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid `server`: takes a name label or `name`, not both"
    );

    let err = build(&document(vec![section("backend", Some("app"), vec![neither.into()])]))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "`server` requires exactly one name label or `name`"
    );
}

#[test]
fn frontend_keys_in_backend_are_misplaced() {
    let err = build(&document(vec![section(
        "backend",
        Some("app"),
        vec![pair("default_backend", "other")],
    )]))
    .unwrap_err();

    assert_eq!(
        err,
        BuildError::Misplaced {
            directive: "default_backend".to_string(),
            section: "backend `app`".to_string(),
            at: At(None),
        }
    );
}

#[test]
fn unknown_section_keys() {
    for kind in ["frontend", "backend", "listen"] {
        let err = build(&document(vec![section(kind, Some("app"), vec![pair("balancing", "x")])]))
            .unwrap_err();

        assert_eq!(
            err,
            BuildError::UnknownKey {
                key: "balancing".to_string(),
                directive: kind.to_string(),
                at: At(None),
            }
        );
    }
}

#[test]
fn server_requires_address() {
    let server = ObjectNode::new("server").label("web1");

    let err = build(&document(vec![section(
        "backend",
        Some("app"),
        vec![server.into()],
    )]))
    .unwrap_err();

    assert_eq!(err.to_string(), "`server` requires `address`");
}

#[test]
fn global_may_appear_once() {
    let err = build(&document(vec![
        section("global", None, vec![pair("daemon", true)]),
        section("global", None, vec![]),
    ]))
    .unwrap_err();

    assert!(matches!(err, BuildError::DuplicateSection { kind, .. } if kind == "global"));
}

#[test]
fn global_on_off_switches_stay_unset() {
    let root = build(&document(vec![section(
        "global",
        None,
        vec![pair("ssl_keylog", false), pair("maxconn", 4096i64)],
    )]))
    .unwrap();

    let global = root.global.unwrap();
    assert_eq!(global.ssl_keylog, Some(false));
    assert_eq!(global.listener_multi_queue, None);
    assert_eq!(global.maxconn, Some(4096));
}

#[test]
fn env_falls_back_to_default() {
    let value = evaluate(
        &Expr::Env {
            name: "LBC_TEST_SURELY_NOT_SET".to_string(),
            default: Some(Box::new(Expr::Literal("fallback".into()))),
        },
        None,
    )
    .unwrap();
    assert_eq!(value, Value::from("fallback"));

    let err = evaluate(
        &Expr::Env {
            name: "LBC_TEST_SURELY_NOT_SET".to_string(),
            default: None,
        },
        None,
    )
    .unwrap_err();
    assert!(matches!(err, BuildError::MissingEnvironment { .. }));
}

#[test]
fn errors_carry_positions() {
    let mut server = ObjectNode::new("server").label("web1");
    server.position = Some(Position { line: 4, column: 5 });

    let err = build(&document(vec![section(
        "backend",
        Some("app"),
        vec![server.into()],
    )]))
    .unwrap_err();

    assert_eq!(err.to_string(), "`server` requires `address` at 4:5");
}
