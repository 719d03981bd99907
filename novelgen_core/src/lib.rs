pub use api::{HttpNovelApi, NovelApi};
pub use config::Config;
pub use controller::{
    apply_model_list, render_chapter_list, ChapterListItem, ChapterListSink, ChapterStatus,
    GenerationOutcome, LoadingIndicator, ModelListSink, NovelController, Notifier, PageState,
    PendingGeneration, ResultSink, ViewPorts,
};
pub use debounce::Debouncer;
pub use error::{ApiError, ApiResult, UserInputError};
pub use model::{Chapter, GenerationForm, GenerationRequest, Mode, Model, ModelOption, Novel};
pub use word_count::count_words;

pub mod api;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod model;
pub mod word_count;
