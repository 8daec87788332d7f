use std::env;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::{Layer, Registry};

pub mod config;
pub mod error;
pub mod g2p;
pub mod lexicon;
pub mod phonemes;
pub mod romaniser;
pub mod text_normaliser;
pub mod tokeniser;
pub mod training;

pub use config::*;
pub use error::LexiconError;
pub use g2p::G2pModel;
pub use lexicon::Lexicon;

pub fn setup_logging() {
    let filter = match env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_env("RUST_LOG"),
        _ => EnvFilter::new("zhuyin_kaldi=info,prepare_data=info"),
    };

    let fmt = tracing_subscriber::fmt::Layer::default();

    let subscriber = filter.and_then(fmt).with_subscriber(Registry::default());

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Logging already initialised: {}", e);
    }
}
