//! Collaborator implementations

pub mod browser_client;
pub mod openai_classifier;

#[cfg(test)]
mod tests;

pub use browser_client::HttpBrowserClient;
pub use openai_classifier::OpenAiClassifier;
