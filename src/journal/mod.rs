//! Journal session state.
//!
//! The [`Journal`] is the single owner of the in-memory history and the
//! active view. Only two things change it: appending a reflection and
//! switching the view. Submissions take `&mut self`, so a second generation
//! cannot start while one is in flight.

use tracing::info;

use crate::reflection::{Reflection, ReflectionGenerator, ReflectionInput};

/// The screens a journal session moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Writing a new note.
    #[default]
    Input,
    /// Waiting for generation to finish.
    Loading,
    /// Showing the reflection that was just generated.
    Reveal,
    /// Browsing past reflections.
    Archive,
    /// Browsing other people's reflections.
    Social,
}

impl View {
    /// Whether the navigation bar is shown on this view.
    pub fn shows_tab_bar(self) -> bool {
        matches!(self, View::Input | View::Archive | View::Social)
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            View::Input => write!(f, "input"),
            View::Loading => write!(f, "loading"),
            View::Reveal => write!(f, "reveal"),
            View::Archive => write!(f, "archive"),
            View::Social => write!(f, "social"),
        }
    }
}

/// An in-memory journal session.
pub struct Journal {
    generator: ReflectionGenerator,
    history: Vec<Reflection>,
    current: Option<Reflection>,
    view: View,
}

impl Journal {
    pub fn new(generator: ReflectionGenerator) -> Self {
        Self {
            generator,
            history: Vec::new(),
            current: None,
            view: View::default(),
        }
    }

    /// Reflections, newest first.
    pub fn history(&self) -> &[Reflection] {
        &self.history
    }

    /// The reflection most recently revealed, if any.
    pub fn current(&self) -> Option<&Reflection> {
        self.current.as_ref()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn set_view(&mut self, view: View) {
        self.view = view;
    }

    pub fn generator(&self) -> &ReflectionGenerator {
        &self.generator
    }

    /// Records a note.
    ///
    /// Text-only input is stored immediately and the archive is shown.
    /// Otherwise the journal passes through the loading view, generates the
    /// reflection, and reveals it. Returns the stored reflection.
    pub async fn submit(&mut self, input: ReflectionInput) -> &Reflection {
        if input.skip_image {
            let reflection = self.generator.text_only(&input);
            self.append(reflection);
            self.set_view(View::Archive);
            return &self.history[0];
        }

        self.set_view(View::Loading);
        let reflection = self.generator.generate(&input).await;
        self.current = Some(reflection.clone());
        self.append(reflection);
        self.set_view(View::Reveal);
        &self.history[0]
    }

    /// Leaves the reveal screen for the archive.
    pub fn save(&mut self) {
        self.set_view(View::Archive);
    }

    fn append(&mut self, reflection: Reflection) {
        info!(
            id = %reflection.id,
            provenance = %reflection.provenance,
            "Adding reflection to journal"
        );
        self.history.insert(0, reflection);
    }
}
