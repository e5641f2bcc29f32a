//! One editing session over a task's flat settings and nested document.

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use trainerdeck_api::{NEW_TASK_ID, SaveRequest};
use trainerdeck_api_client::ApiClient;
use trainerdeck_core::form::{EditorForm, FieldPath};
use trainerdeck_core::settings::{IMAGE_EXTENSIONS, PathTarget, Settings};
use trainerdeck_core::{ConfigDocument, Profile};

use crate::picker::PathPicker;

/// Where the document in the form came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSource {
    Persisted,
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// The backend stored the task under a new id; the session now edits it.
    Retargeted { from: String, to: String },
}

pub struct EditorSession {
    api: ApiClient,
    task_id: String,
    settings: Settings,
    form: EditorForm,
    source: DocumentSource,
}

impl EditorSession {
    /// Load a task's settings, then its persisted document.
    ///
    /// New tasks, and tasks whose document the backend cannot serve, start
    /// from the profile template. `fallback_profile` applies when the
    /// settings do not name a profile.
    pub async fn open(api: ApiClient, task_id: &str, fallback_profile: Profile) -> Result<Self> {
        let loaded = api
            .load_task(task_id)
            .await
            .with_context(|| format!("Failed to load task {task_id}"))?;
        if !loaded.envelope.is_success() {
            bail!("LOAD ERROR: {}", loaded.envelope.failure_message());
        }
        let (profile, settings) = Settings::from_flat(&loaded.config);
        let profile = profile.unwrap_or(fallback_profile);

        let persisted = if task_id == NEW_TASK_ID {
            None
        } else {
            let resp = api
                .get_json_config(task_id)
                .await
                .context("Network Error")?;
            match resp.data {
                Some(data) if resp.envelope.is_success() => {
                    match ConfigDocument::from_value(profile.shape(), &data) {
                        Ok(doc) => Some(doc),
                        Err(err) => {
                            warn!(task = task_id, "ignoring persisted document: {err}");
                            None
                        }
                    }
                }
                _ => None,
            }
        };

        let (form, source) = match persisted {
            Some(doc) => (EditorForm::load(profile, &doc)?, DocumentSource::Persisted),
            None => (EditorForm::from_template(profile)?, DocumentSource::Template),
        };
        info!(task = task_id, profile = %form.profile(), ?source, "editor opened");

        Ok(Self {
            api,
            task_id: task_id.to_string(),
            settings,
            form,
            source,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn source(&self) -> DocumentSource {
        self.source
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn form(&self) -> &EditorForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut EditorForm {
        &mut self.form
    }

    /// Settings and form borrowed together, for edits that touch either.
    pub fn parts_mut(&mut self) -> (&mut Settings, &mut EditorForm) {
        (&mut self.settings, &mut self.form)
    }

    pub fn switch_profile(&mut self, profile: Profile) -> Result<()> {
        self.form.switch_profile(profile)?;
        self.source = DocumentSource::Template;
        Ok(())
    }

    /// The body `save` would post.
    pub fn payload(&self) -> Result<SaveRequest> {
        let document = self.form.to_document()?;
        Ok(SaveRequest {
            task_name: self.task_id.clone(),
            yaml_updates: self.settings.collect(self.form.profile()),
            json_data: document.to_value()?,
        })
    }

    /// Persist settings and document. On failure nothing in the session
    /// changes.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let req = self.payload()?;
        let resp = self.api.save(&req).await.context("Net Error")?;
        if !resp.envelope.is_success() {
            bail!("Error: {}", resp.envelope.failure_message());
        }
        match resp.new_task_id {
            Some(new_id) if !new_id.is_empty() && new_id != self.task_id => {
                let from = std::mem::replace(&mut self.task_id, new_id.clone());
                info!(from = %from, to = %new_id, "task saved under new id");
                Ok(SaveOutcome::Retargeted { from, to: new_id })
            }
            _ => Ok(SaveOutcome::Saved),
        }
    }

    /// Choose a path for a flat setting that offers a chooser.
    pub async fn pick_setting(&mut self, picker: &PathPicker, name: &str) -> Result<Option<String>> {
        let target = self
            .settings
            .get(name)
            .and_then(|input| input.picker.clone())
            .with_context(|| format!("{name} has no path chooser"))?;
        let Some(path) = picker.pick(&target).await? else {
            return Ok(None);
        };
        self.settings.apply_picked_path(name, &path)?;
        Ok(self.settings.text(name).map(str::to_string))
    }

    /// Choose a folder for a dataset directory field.
    pub async fn pick_field(&mut self, picker: &PathPicker, path: FieldPath) -> Result<Option<String>> {
        let kind = self
            .form
            .field(path)
            .and_then(|field| field.spec.picker)
            .with_context(|| format!("{path} has no path chooser"))?;
        let target = PathTarget {
            kind,
            extensions: Vec::new(),
        };
        let Some(picked) = picker.pick(&target).await? else {
            return Ok(None);
        };
        self.form.set_text(path, &picked)?;
        Ok(Some(picked))
    }

    /// Choose an image file for one control image slot of a sample.
    pub async fn pick_control_image(
        &mut self,
        picker: &PathPicker,
        sample: usize,
        slot: usize,
    ) -> Result<Option<String>> {
        let slots = self
            .form
            .samples()
            .get(sample)
            .map(|block| block.control_images().len())
            .with_context(|| format!("no sample block at index {sample}"))?;
        if slot >= slots {
            bail!("sample {sample} has no control image slot {slot}");
        }
        let Some(picked) = picker.pick(&PathTarget::file(IMAGE_EXTENSIONS)).await? else {
            return Ok(None);
        };
        self.form.sample_mut(sample)?.set_control_image(slot, &picked)?;
        Ok(Some(picked))
    }
}
