//! Page controller for the novel generator.
//!
//! The controller owns the page state (current novel, active chapter, in-flight
//! flag) and talks to the rendering surface only through the [`ViewPorts`]
//! capability set, so it runs the same against the terminal UI and a test double.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::NovelApi;
use crate::error::{ApiError, ApiResult, UserInputError};
use crate::model::{Chapter, GenerationForm, GenerationRequest, Model, ModelOption, Novel};
use crate::word_count::count_words;

pub const MODELS_UNAVAILABLE_LABEL: &str = "Failed to load models";

/// Receives the model selector contents.
pub trait ModelListSink {
    fn set_model_options(&mut self, options: Vec<ModelOption>);
}

/// The result region plus the novel title line above it.
pub trait ResultSink {
    fn clear_result(&mut self);
    /// The title lives outside the result region and survives `clear_result`.
    fn set_novel_title(&mut self, title: &str);
    fn push_heading(&mut self, text: &str);
    /// Plain text. Implementations must not interpret it as markup.
    fn push_text(&mut self, text: &str);
    fn push_error(&mut self, message: &str);
}

pub trait ChapterListSink {
    fn clear_chapter_list(&mut self);
    fn push_chapter_item(&mut self, item: ChapterListItem);
    fn set_item_active(&mut self, index: usize, active: bool);
    fn chapter_item_count(&self) -> usize;
}

pub trait LoadingIndicator {
    fn set_loading(&mut self, visible: bool);
}

/// Blocking user notices (the browser's `alert`).
pub trait Notifier {
    fn alert(&mut self, message: &str);
}

pub trait ViewPorts: ModelListSink + ResultSink + ChapterListSink + LoadingIndicator + Notifier {}

impl<T> ViewPorts for T where
    T: ModelListSink + ResultSink + ChapterListSink + LoadingIndicator + Notifier + ?Sized
{
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterStatus {
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterListItem {
    pub index: usize,
    pub title: String,
    pub word_count: usize,
    pub status: ChapterStatus,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    pub current_novel: Option<Novel>,
    pub active_chapter: Option<usize>,
}

/// Single permit over the in-flight flag. Released on drop.
#[derive(Debug)]
struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl InFlightGuard {
    fn try_acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// A generation that passed its preconditions and holds the in-flight permit.
///
/// Hand it back to [`NovelController::finish_generation`] with the API outcome.
/// Dropping it instead still clears the in-flight flag.
#[derive(Debug)]
pub struct PendingGeneration {
    request: GenerationRequest,
    _permit: InFlightGuard,
}

impl PendingGeneration {
    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Rejected(UserInputError),
    Rendered { chapters: usize },
    Failed(ApiError),
}

pub struct NovelController {
    api: Arc<dyn NovelApi>,
    state: PageState,
    in_flight: Arc<AtomicBool>,
}

impl NovelController {
    pub fn new(api: Arc<dyn NovelApi>) -> Self {
        Self {
            api,
            state: PageState::default(),
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn api(&self) -> Arc<dyn NovelApi> {
        Arc::clone(&self.api)
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn is_generating(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Checks preconditions, takes the in-flight permit and resets the page for
    /// a new result. Rejections are reported through [`Notifier::alert`].
    pub fn begin_generation<V: ViewPorts + ?Sized>(
        &mut self,
        form: &GenerationForm,
        view: &mut V,
    ) -> Result<PendingGeneration, UserInputError> {
        let rejection = if self.is_generating() {
            Some(UserInputError::GenerationInProgress)
        } else if form.trimmed_prompt().is_empty() {
            Some(UserInputError::EmptyPrompt)
        } else {
            None
        };
        if let Some(err) = rejection {
            tracing::debug!(reason = %err, "generation rejected");
            view.alert(&err.to_string());
            return Err(err);
        }

        let Some(permit) = InFlightGuard::try_acquire(&self.in_flight) else {
            let err = UserInputError::GenerationInProgress;
            view.alert(&err.to_string());
            return Err(err);
        };

        view.set_loading(true);
        view.clear_result();
        view.clear_chapter_list();

        Ok(PendingGeneration {
            request: form.to_request(),
            _permit: permit,
        })
    }

    /// Renders the outcome of a pending generation, then releases the permit and
    /// hides the loading indicator whatever the outcome was.
    pub fn finish_generation<V: ViewPorts + ?Sized>(
        &mut self,
        pending: PendingGeneration,
        outcome: ApiResult<Novel>,
        view: &mut V,
    ) -> GenerationOutcome {
        let result = match outcome {
            Ok(novel) => {
                let chapters = novel.chapters.len();
                tracing::info!(title = %novel.title, chapters, "generation succeeded");
                self.render_novel(novel, view);
                GenerationOutcome::Rendered { chapters }
            }
            Err(err) => {
                tracing::warn!(error = %err, "generation failed");
                view.push_error(&format!("Generation failed: {}", err));
                GenerationOutcome::Failed(err)
            }
        };

        drop(pending);
        view.set_loading(false);
        result
    }

    /// Runs a whole generation cycle: preconditions, request, render.
    pub async fn generate<V: ViewPorts + ?Sized>(
        &mut self,
        form: &GenerationForm,
        view: &mut V,
    ) -> GenerationOutcome {
        let pending = match self.begin_generation(form, view) {
            Ok(pending) => pending,
            Err(err) => return GenerationOutcome::Rejected(err),
        };

        let api = Arc::clone(&self.api);
        let outcome = api.generate(pending.request()).await;
        self.finish_generation(pending, outcome, view)
    }

    fn render_novel<V: ViewPorts + ?Sized>(&mut self, novel: Novel, view: &mut V) {
        view.set_novel_title(&novel.title);
        render_chapter_list(&novel.chapters, view);
        let has_chapters = !novel.chapters.is_empty();

        self.state.active_chapter = None;
        self.state.current_novel = Some(novel);

        if has_chapters {
            self.show_chapter(0, view);
        }
    }

    /// Click on a chapter list item. Indexes with no rendered item are ignored,
    /// so a cleared list (failed or in-flight generation) keeps its result region.
    pub fn activate_chapter<V: ViewPorts + ?Sized>(&mut self, index: usize, view: &mut V) {
        let count = view.chapter_item_count();
        if index >= count {
            return;
        }
        for i in 0..count {
            view.set_item_active(i, i == index);
        }
        self.show_chapter(index, view);
    }

    /// Shows one chapter in the result region. Out-of-range indexes are ignored.
    pub fn show_chapter<V: ViewPorts + ?Sized>(&mut self, index: usize, view: &mut V) {
        let Some(chapter) = self
            .state
            .current_novel
            .as_ref()
            .and_then(|novel| novel.chapter(index))
        else {
            return;
        };

        view.clear_result();
        view.push_heading(&chapter.title);
        view.push_text(&chapter.content);
        self.state.active_chapter = Some(index);

        for i in 0..view.chapter_item_count() {
            view.set_item_active(i, i == index);
        }
    }
}

/// Fills the model selector from a `/models` outcome. Any failure leaves a
/// single disabled placeholder.
pub fn apply_model_list<V: ModelListSink + ?Sized>(result: ApiResult<Vec<Model>>, view: &mut V) {
    match result {
        Ok(models) => {
            tracing::info!(count = models.len(), "model list loaded");
            view.set_model_options(models.iter().map(Model::to_option).collect());
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to load model list");
            view.set_model_options(vec![ModelOption::placeholder(MODELS_UNAVAILABLE_LABEL)]);
        }
    }
}

/// Rebuilds the chapter list in input order.
pub fn render_chapter_list<V: ChapterListSink + ?Sized>(chapters: &[Chapter], view: &mut V) {
    view.clear_chapter_list();
    for (index, chapter) in chapters.iter().enumerate() {
        view.push_chapter_item(ChapterListItem {
            index,
            title: chapter.title.clone(),
            word_count: count_words(&chapter.content),
            status: ChapterStatus::Ready,
            active: false,
        });
    }
}
