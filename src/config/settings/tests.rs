use super::*;
use tempfile::TempDir;

#[test]
fn default_config() {
    let config = Config::default();
    assert_eq!(config.ollama.protocol, "http");
    assert_eq!(config.ollama.host, "localhost");
    assert_eq!(config.ollama.port, 11434);
    assert_eq!(config.ollama.model, "nomic-embed-text:latest");
    assert_eq!(config.ollama.timeout_secs, 30);
    assert_eq!(config.server.port, 8787);
    assert_eq!(config.search.top_k, 1);
}

#[test]
fn config_validation() {
    let config = Config::default();
    assert!(config.validate().is_ok());

    let mut invalid_config = config.clone();
    invalid_config.ollama.protocol = "ftp".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.port = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.ollama.model = String::new();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.server.request_timeout_secs = 0;
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config.clone();
    invalid_config.server.host = "not an address".to_string();
    assert!(invalid_config.validate().is_err());

    let mut invalid_config = config;
    invalid_config.search.top_k = 0;
    assert!(invalid_config.validate().is_err());
}

#[test]
fn ollama_url_generation() {
    let config = Config::default();
    let url = config
        .ollama_url()
        .expect("should generate ollama_url successfully");
    assert_eq!(url.as_str(), "http://localhost:11434/");
}

#[test]
fn listen_addr_generation() {
    let config = Config::default();
    let addr = config.listen_addr().expect("default address should parse");
    assert_eq!(addr.to_string(), "127.0.0.1:8787");
}

#[test]
fn listen_addr_accepts_hostnames_and_ipv6() {
    let mut server = ServerConfig::default();

    server
        .set_host("localhost".to_string())
        .expect("localhost should be accepted");
    let addr = server.listen_addr().expect("localhost should resolve");
    assert!(addr.ip().is_loopback());
    assert_eq!(addr.port(), 8787);

    server
        .set_host("::1".to_string())
        .expect("bare IPv6 loopback should be accepted");
    assert_eq!(
        server.listen_addr().expect("::1 should parse").to_string(),
        "[::1]:8787"
    );

    server
        .set_host("[::1]".to_string())
        .expect("bracketed IPv6 should be accepted");
    assert_eq!(
        server.listen_addr().expect("[::1] should parse").to_string(),
        "[::1]:8787"
    );
}

#[test]
fn localhost_server_config_loads() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[server]\nhost = \"localhost\"\nport = 9000\n",
    )
    .expect("should write config");

    let config = Config::load(temp_dir.path()).expect("localhost host should load");
    assert_eq!(config.server.host, "localhost");
    assert_eq!(config.listen_addr().expect("should resolve").port(), 9000);
}

#[test]
fn toml_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string(&config).expect("should serialize toml correctly");
    let parsed_config: Config = toml::from_str(&toml_str).expect("should parse toml correctly");
    assert_eq!(config, parsed_config);
}

#[test]
fn setter_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_protocol("https".to_string()).is_ok());
    assert!(config.set_host("example.com".to_string()).is_ok());
    assert!(config.set_port(8080).is_ok());
    assert!(config.set_model("new-model".to_string()).is_ok());
    assert!(config.set_timeout_secs(120).is_ok());

    assert!(config.set_protocol("ftp".to_string()).is_err());
    assert!(config.set_port(0).is_err());
    assert!(config.set_model(String::new()).is_err());
    assert!(config.set_timeout_secs(0).is_err());
    assert!(config.set_timeout_secs(601).is_err());

    let mut search = SearchConfig::default();
    assert!(search.set_top_k(5).is_ok());
    assert_eq!(search.top_k, 5);
    assert!(search.set_top_k(0).is_err());
    assert!(search.set_top_k(MAX_TOP_K + 1).is_err());
}

#[test]
fn load_missing_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let config = Config::load(temp_dir.path()).expect("missing config should fall back to defaults");

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.ollama, OllamaConfig::default());
    assert_eq!(config.vector_database_path(), temp_dir.path().join("vectors"));
}

#[test]
fn save_and_reload() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = Config::load(temp_dir.path()).expect("should load defaults");
    config.ollama.model = "mxbai-embed-large".to_string();
    config.search.top_k = 3;
    config.save().expect("should save config");

    let reloaded = Config::load(temp_dir.path()).expect("should reload config");
    assert_eq!(reloaded, config);
}

#[test]
fn load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    fs::write(
        temp_dir.path().join("config.toml"),
        "[search]\ntop_k = 0\n",
    )
    .expect("should write config");

    assert!(Config::load(temp_dir.path()).is_err());
}

#[test]
fn https_url_generation() {
    let mut config = Config::default();
    config.ollama.protocol = "https".to_string();
    config.ollama.host = "secure.example.com".to_string();
    config.ollama.port = 443;

    let url = config
        .ollama_url()
        .expect("should generate https url successfully");
    assert_eq!(url.as_str(), "https://secure.example.com/");
}

#[test]
fn protocol_validation() {
    let mut config = OllamaConfig::default();

    assert!(config.set_protocol("http".to_string()).is_ok());
    assert!(config.set_protocol("https".to_string()).is_ok());

    assert!(config.set_protocol("ftp".to_string()).is_err());
    assert!(config.set_protocol("ws".to_string()).is_err());
    assert!(config.set_protocol(String::new()).is_err());
    assert!(config.set_protocol("HTTP".to_string()).is_err()); // case sensitive
}
