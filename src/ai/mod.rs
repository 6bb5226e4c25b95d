pub mod adapter;
pub mod cache;
pub mod classifier;
pub mod credentials;
pub mod gemini;
pub mod http_client;
pub mod json_parser;
pub mod prompts;
pub mod shortcuts;
pub mod types;

pub use adapter::{ClassifierAdapter, ClassifyRequest};
pub use cache::ClassificationCache;
pub use classifier::{Classifier, ClassifierError};
pub use credentials::{CredentialError, CredentialManager};
pub use gemini::GeminiClassifier;
pub use types::{Classification, ClassificationResult, Confidence, FailureKind};
