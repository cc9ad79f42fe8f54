//! Lexicon resolution and custom keyword sets.

use serial_test::serial;
use std::{env, fs};

use worldview_synthesis::lexicon::ENV_LEXICON_PATH;
use worldview_synthesis::{classify, Direction, Lexicon, RawItem, Sector, SignalExtractor, SourceTrustTable};

const CUSTOM: &str = r#"
bullish = ["ape", "send it"]
bearish = ["rug"]

[[assets]]
id = "cashtag"
pattern = '\$([A-Z]{2,5})\b'

[sectors]
crypto = ["DOGE"]
social = ["RDDT"]
"#;

#[test]
fn custom_lexicon_drives_extraction_and_sectors() {
    let lex = Lexicon::from_toml_str(CUSTOM).unwrap();
    let ex = SignalExtractor::new(lex.clone());
    let item = RawItem::bare("x", "s", "s", Some("ape into $DOGE and send it, bullish"));
    let sig = ex.extract(&item, &SourceTrustTable::default());
    // "bullish" is not a keyword here.
    assert_eq!(sig.bullish_signals, 2);
    assert_eq!(sig.direction, Direction::Long);
    assert_eq!(sig.primary_asset.as_deref(), Some("DOGE"));

    assert_eq!(classify(&lex, "DOGE"), vec![Sector::CryptoAi]);
    assert_eq!(classify(&lex, "BTC"), vec![Sector::TradEquities]);
    assert_eq!(
        classify(&lex, "RDDT"),
        vec![Sector::SocialMedia, Sector::TradEquities]
    );
}

#[test]
fn bad_pattern_names_its_id() {
    let bad = r#"
        [[assets]]
        id = "broken_ticker"
        pattern = '(unclosed'
    "#;
    let err = Lexicon::from_toml_str(bad).unwrap_err();
    assert!(format!("{err:#}").contains("broken_ticker"));
}

#[serial]
#[test]
fn default_uses_env_then_local_then_builtin() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_LEXICON_PATH);

    // No files in the temp CWD: built-in.
    let lex = Lexicon::load_default().unwrap();
    assert!(lex.is_crypto("BTC"));

    // Local config/lexicon.toml beats the built-in.
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(tmp.path().join("config/lexicon.toml"), CUSTOM).unwrap();
    let lex = Lexicon::load_default().unwrap();
    assert!(lex.is_crypto("DOGE"));
    assert!(!lex.is_crypto("BTC"));

    // Env wins, and must point at a real file.
    let p = tmp.path().join("other.toml");
    fs::write(&p, "[sectors]\ncrypto = [\"XMR\"]\n").unwrap();
    env::set_var(ENV_LEXICON_PATH, p.display().to_string());
    assert!(Lexicon::load_default().unwrap().is_crypto("XMR"));
    env::set_var(ENV_LEXICON_PATH, tmp.path().join("nope.toml").display().to_string());
    assert!(Lexicon::load_default().is_err());

    env::remove_var(ENV_LEXICON_PATH);
    env::set_current_dir(&old).unwrap();
}
