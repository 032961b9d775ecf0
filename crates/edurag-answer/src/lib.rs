//! Question answering over a subject's index: retrieve the closest chunks and
//! hand them with the question to a generative model.

pub mod error;
pub mod gemini;
pub mod generator;
pub mod service;

pub use error::{AnswerError, GenerateError};
pub use gemini::GeminiGenerator;
pub use generator::{build_prompt, Generator};
pub use service::QueryService;
