//! peers, resolvers and mailers sections
use super::{address, Line, Writer};
use crate::ir::{Endpoint, Mailers, Peers, Resolvers};

fn endpoint(keyword: &str, endpoint: &Endpoint) -> Line {
    Line::new(keyword)
        .word(&endpoint.name)
        .word(address(&endpoint.address, endpoint.port))
}

pub(super) fn peers(writer: &mut Writer, peers: &Peers) {
    writer.section(format_args!("peers {}", peers.name));
    for peer in &peers.peers {
        writer.line(endpoint("peer", peer));
    }
}

pub(super) fn resolvers(writer: &mut Writer, resolvers: &Resolvers) {
    writer.section(format_args!("resolvers {}", resolvers.name));
    for nameserver in &resolvers.nameservers {
        writer.line(endpoint("nameserver", nameserver));
    }
    writer.flag("parse-resolv-conf", resolvers.parse_resolv_conf);
    writer.opt("resolve_retries", &resolvers.resolve_retries);
    writer.opt("timeout resolve", &resolvers.timeout_resolve);
    writer.opt("timeout retry", &resolvers.timeout_retry);
    for (status, period) in &resolvers.hold {
        writer.line(format_args!("hold {status} {period}"));
    }
    writer.opt("accepted_payload_size", &resolvers.accepted_payload_size);
}

pub(super) fn mailers(writer: &mut Writer, mailers: &Mailers) {
    writer.section(format_args!("mailers {}", mailers.name));
    for mailer in &mailers.mailers {
        writer.line(endpoint("mailer", mailer));
    }
    writer.opt("timeout mail", &mailers.timeout_mail);
}

#[cfg(test)]
mod test {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolvers_section() {
        let mut writer = Writer::default();
        resolvers(
            &mut writer,
            &Resolvers {
                name: "dns".to_string(),
                nameservers: vec![Endpoint {
                    name: "ns1".to_string(),
                    address: "10.0.0.53".to_string(),
                    port: Some(53),
                }],
                resolve_retries: Some(3),
                hold: IndexMap::from([("valid".to_string(), "10s".to_string())]),
                ..Default::default()
            },
        );

        assert_eq!(
            writer.text,
            "resolvers dns\n    nameserver ns1 10.0.0.53:53\n    resolve_retries 3\n    hold valid 10s\n"
        );
    }
}
