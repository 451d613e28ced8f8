use std::fs;

use figment::Jail;
use healthdialog_core::config::{Config, ScoringStrategy};
use healthdialog_core::CorpusStore;
use tempfile::TempDir;

#[test]
fn load_corpus_from_csv_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("clinical_faq.csv");
    fs::write(
        &path,
        "question,answer\nWhat causes fever?,Fever is commonly caused by infection.\nWhat helps a headache?,\"Rest, hydration, and over-the-counter analgesics can help.\"\n",
    )
    .unwrap();

    let store = CorpusStore::load(&path).expect("load");

    assert_eq!(store.len(), 2);
    assert_eq!(store.get(0).unwrap().answer, "Fever is commonly caused by infection.");
    assert_eq!(store.entries()[1].row_id, 1, "row ids follow file order");
}

#[test]
fn load_missing_file_is_a_corpus_error() {
    let tmp = TempDir::new().unwrap();
    let err = CorpusStore::load(&tmp.path().join("nope.csv")).unwrap_err();
    assert!(err.to_string().contains("nope.csv"));
}

#[test]
fn config_layers_toml_env_and_defaults() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file(
            "config.toml",
            r#"
            [retrieval]
            top_k = 5

            [scoring]
            strategy = "semantic_consistency"
            "#,
        )?;
        jail.create_file("config.test.toml", "[server]\nport = 9100\n")?;
        jail.set_env("APP_GENERATION__MODEL", "gpt-test");
        jail.set_env("OPENAI_API_KEY", "sk-from-env");

        let config = Config::load().expect("config");
        let settings = config.settings().expect("settings");

        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.scoring.strategy, ScoringStrategy::SemanticConsistency);
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.server.host, "127.0.0.1", "untouched keys keep defaults");
        assert_eq!(settings.generation.model, "gpt-test");
        assert_eq!(settings.generation.api_key.as_deref(), Some("sk-from-env"));
        assert_eq!(config.get::<usize>("retrieval.top_k").expect("get"), 5);
        Ok(())
    });
}

#[test]
fn prod_rejects_fake_embedder() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "prod");
        jail.create_file("config.toml", "[embedding]\nuse_fake = true\n")?;
        assert!(Config::load().is_err());
        Ok(())
    });
}

#[test]
fn prod_rejects_fake_embedder_forced_by_env() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "prod");
        jail.set_env("APP_USE_FAKE_EMBEDDINGS", "1");
        jail.create_file("config.toml", "[embedding]\nuse_fake = false\n")?;
        assert!(Config::load().is_err());
        Ok(())
    });
}

#[test]
fn env_flag_forces_fake_embedder_outside_prod() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.set_env("APP_USE_FAKE_EMBEDDINGS", "true");
        let settings = Config::load().expect("config").settings().expect("settings");
        assert!(settings.embedding.use_fake);
        Ok(())
    });
}
