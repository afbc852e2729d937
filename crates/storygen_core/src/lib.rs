pub mod domain;
pub mod generator;
pub mod parser;
pub mod ports;
pub mod prompt;

pub use domain::{
    AcStyle, GeneratedStory, GenerationRequest, GenerationResult, NewStory, RequestError,
    StoredStory, StoryPatch, StoryStats, StoryStyle, TestCases,
};
pub use generator::{AttemptError, GenerationFailed, StoryGenerator, MAX_ATTEMPTS, RETRY_DELAY};
pub use parser::{parse_stories, strip_code_fences, ParseError};
pub use ports::{ChatModelService, PortError, PortResult, StoryStoreService};
pub use prompt::{build_prompt, ChatPrompt};
