use ferrous_nftset_domain::{
    CliOverrides, Config, ConfigError, DispatchMode, LogFormat, SetKeyType, SetRuleConfig,
    TableFamily,
};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.server.dns_port, 53);
    assert_eq!(config.server.upstream, "127.0.0.1:5353");
    assert_eq!(config.server.query_timeout_ms, 2000);

    assert_eq!(config.nftables.connection_timeout(), Duration::from_secs(300));
    assert_eq!(config.nftables.set_lru_timeout(), Duration::from_secs(720 * 3600));
    assert_eq!(config.nftables.set_lru_max_count, 10_000);
    assert_eq!(config.nftables.set_lru_max_retry_times, 2_147_483_647);
    assert_eq!(config.nftables.dispatch_mode(), DispatchMode::Sync);
    assert_eq!(config.nftables.nft_binary, "nft");
    assert!(config.nftables.rules.is_empty());

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Compact);
}

#[test]
fn test_default_config_is_valid() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn test_config_from_toml() {
    let config = Config::from_toml(
        r#"
        [server]
        dns_port = 5300
        upstream = "9.9.9.9:53"

        [nftables]
        connection_timeout_secs = 60
        set_lru_max_count = 0
        async_mode = true

        [[nftables.rules]]
        family = "inet"
        table = "filter"
        set = "resolved4"
        element_timeout_secs = 3600

        [[nftables.rules]]
        family = "ipv6"
        table = "filter6"
        set = "resolved6"
        auto_create_set = false

        [logging]
        level = "debug"
        format = "json"
        "#,
    )
    .unwrap();

    assert_eq!(config.server.dns_port, 5300);
    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.nftables.connection_timeout_secs, 60);
    assert_eq!(config.nftables.set_lru_max_count, 0);
    assert_eq!(config.nftables.dispatch_mode(), DispatchMode::Async);
    assert_eq!(config.logging.format, LogFormat::Json);

    let rules = &config.nftables.rules;
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].family, TableFamily::Inet);
    assert_eq!(rules[0].element_timeout(), Some(Duration::from_secs(3600)));
    assert!(rules[0].auto_create_set);
    assert_eq!(rules[1].family, TableFamily::Ip6);
    assert_eq!(rules[1].effective_key_type(), SetKeyType::Ipv6Addr);
    assert!(!rules[1].auto_create_set);

    assert!(config.validate().is_ok());
}

#[test]
fn test_config_from_invalid_toml() {
    let result = Config::from_toml("[server\ndns_port = 53");

    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_config_load_from_file_with_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"[server]\ndns_port = 5300\n").unwrap();

    let overrides = CliOverrides {
        bind_address: Some("127.0.0.1".to_string()),
        async_mode: Some(true),
        ..Default::default()
    };
    let config = Config::load(file.path().to_str(), overrides).unwrap();

    assert_eq!(config.server.dns_port, 5300);
    assert_eq!(config.server.bind_address, "127.0.0.1");
    assert!(config.nftables.async_mode);
}

#[test]
fn test_config_load_missing_file() {
    let result = Config::load(Some("/nonexistent/ferrous-nftset.toml"), CliOverrides::default());

    assert!(matches!(result, Err(ConfigError::FileRead(_, _))));
}

#[test]
fn test_listen_address() {
    let mut config = Config::default();
    config.server.bind_address = "::".to_string();
    config.server.dns_port = 5353;

    assert_eq!(
        config.server.listen_address().unwrap(),
        "[::]:5353".parse().unwrap()
    );
}

// ── validation ─────────────────────────────────────────────────────────────

fn config_with_rule(rule: SetRuleConfig) -> Config {
    let mut config = Config::default();
    config.nftables.rules.push(rule);
    config
}

#[test]
fn test_validate_rejects_zero_port() {
    let mut config = Config::default();
    config.server.dns_port = 0;

    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn test_validate_rejects_bad_upstream() {
    let mut config = Config::default();
    config.server.upstream = "dns.example".to_string();

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_bind_address() {
    let mut config = Config::default();
    config.server.bind_address = "localhost".to_string();

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_connection_timeout() {
    let mut config = Config::default();
    config.nftables.connection_timeout_secs = 0;

    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_bad_identifiers() {
    for (table, set) in [("", "s"), ("t", "1set"), ("t; flush ruleset", "s"), ("t", "s s")] {
        let config = config_with_rule(SetRuleConfig::new(TableFamily::Inet, table, set));
        assert!(config.validate().is_err(), "{table:?} {set:?} should be rejected");
    }
}

#[test]
fn test_validate_rejects_key_type_family_mismatch() {
    let mut rule = SetRuleConfig::new(TableFamily::Ip, "filter", "s");
    rule.key_type = Some(SetKeyType::Ipv6Addr);

    assert!(config_with_rule(rule).validate().is_err());
}

#[test]
fn test_validate_accepts_ipv6_set_in_inet_table() {
    let mut rule = SetRuleConfig::new(TableFamily::Inet, "filter", "resolved6");
    rule.key_type = Some(SetKeyType::Ipv6Addr);

    assert!(config_with_rule(rule).validate().is_ok());
}

#[test]
fn test_validate_rejects_families_without_addresses() {
    for family in [TableFamily::Arp, TableFamily::Netdev] {
        let config = config_with_rule(SetRuleConfig::new(family, "filter", "s"));
        assert!(config.validate().is_err());
    }
}
