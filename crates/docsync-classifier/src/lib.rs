//! docsync change classifier
//!
//! Pure decision function from a documentation diff to an impact verdict:
//! - Prompt/response contract with the reasoning oracle
//! - Verdict validation against the subscriber's step set
//! - Conservative fallback when analysis fails
//! - Documentation path taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use docsync_classifier::{AnthropicConfig, AnthropicOracle, ChangeClassifier, ClassifierConfig};
//! use std::sync::Arc;
//!
//! # async fn example(steps: Vec<docsync_model::OnboardingStep>) -> Result<(), Box<dyn std::error::Error>> {
//! let oracle = AnthropicOracle::new(AnthropicConfig::default())?;
//! let classifier = ChangeClassifier::new(Arc::new(oracle), ClassifierConfig::default());
//!
//! let verdict = classifier.classify("README.md", "old", "new", &steps).await;
//! println!("severity {}", verdict.severity);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod classifier;
pub mod doc_files;
pub mod error;
pub mod oracle;
pub mod prompt;
pub mod verdict;

pub use classifier::{ChangeClassifier, ClassifierConfig};
pub use doc_files::{documentation_files, is_documentation_file, should_sync};
pub use error::{OracleError, VerdictError};
pub use oracle::{extract_json, AnthropicConfig, AnthropicOracle, ReasoningOracle, StructuredRequest};
pub use verdict::{SuggestedUpdate, Verdict, VerdictResponse};
