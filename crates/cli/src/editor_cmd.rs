use anyhow::{Context, Result, bail};
use clap::Subcommand;
use trainerdeck_console::{DocumentSource, EditorSession, PathPicker, SaveOutcome};
use trainerdeck_core::form::{EditorForm, FieldPath, FieldValue};
use trainerdeck_core::settings::SettingControl;
use trainerdeck_core::{Profile, Settings, template};
use trainerdeck_runtime_config::DeckConfig;

use crate::jobs::Deck;

#[derive(Debug, Clone, Subcommand)]
pub enum EditorAction {
    /// Print a task's settings, document fields and sample blocks
    Show {
        task: String,
        /// Print the save payload as JSON instead
        #[arg(long)]
        json: bool,
    },
    /// Change values and save
    ///
    /// Assignments are `key=value`: a flat setting (`qwen.learning_rate=1e-4`),
    /// a document field (`general.batch_size=4`, `datasets.resolution=768x768`)
    /// or a sample value (`samples.0.prompt=A cat`, `samples.0.seed=7`,
    /// `samples.0.control.1=/data/ref.png`).
    Set {
        task: String,
        assignments: Vec<String>,
        /// Append an empty sample block before applying assignments
        #[arg(long)]
        add_sample: bool,
        /// Remove the sample block at this index before applying assignments
        #[arg(long)]
        remove_sample: Option<usize>,
        /// Print the payload instead of saving
        #[arg(long)]
        dry_run: bool,
    },
    /// Reset the document to another profile's template and save
    SwitchProfile {
        task: String,
        profile: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Choose a path with the backend's chooser and save
    Pick {
        task: String,
        /// A flat setting or document field, e.g. `qwen.output_dir`
        target: Option<String>,
        /// Control image slot as SAMPLE:SLOT
        #[arg(long, conflicts_with = "target")]
        control: Option<String>,
    },
    /// Print a profile's default document
    Defaults { profile: String },
}

pub async fn run(action: EditorAction, deck: &Deck, config: &DeckConfig) -> Result<()> {
    let fallback = Profile::new(config.editor.default_profile.as_str());
    match action {
        EditorAction::Show { task, json } => {
            let session = EditorSession::open(deck.api.clone(), &task, fallback).await?;
            if json {
                let payload = session.payload()?;
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print!("{}", describe(&session));
            }
            Ok(())
        }
        EditorAction::Set {
            task,
            assignments,
            add_sample,
            remove_sample,
            dry_run,
        } => {
            let mut session = EditorSession::open(deck.api.clone(), &task, fallback).await?;
            if add_sample {
                session.form_mut().add_sample();
            }
            if let Some(index) = remove_sample {
                session.form_mut().remove_sample(index)?;
            }
            for raw in &assignments {
                let assignment = Assignment::parse(raw)?;
                let (settings, form) = session.parts_mut();
                assignment
                    .apply(settings, form)
                    .with_context(|| format!("Failed to apply {raw}"))?;
            }
            finish(&mut session, dry_run).await
        }
        EditorAction::SwitchProfile {
            task,
            profile,
            dry_run,
        } => {
            let mut session = EditorSession::open(deck.api.clone(), &task, fallback).await?;
            session.switch_profile(Profile::new(profile))?;
            finish(&mut session, dry_run).await
        }
        EditorAction::Pick {
            task,
            target,
            control,
        } => {
            let mut session = EditorSession::open(deck.api.clone(), &task, fallback).await?;
            let picker = PathPicker::new(deck.api.clone());
            let picked = match (target, control) {
                (_, Some(slot)) => {
                    let (sample, slot) = parse_slot(&slot)?;
                    session.pick_control_image(&picker, sample, slot).await?
                }
                (Some(target), None) => match FieldPath::parse(&target) {
                    Some(path) => session.pick_field(&picker, path).await?,
                    None => session.pick_setting(&picker, &target).await?,
                },
                (None, None) => bail!("nothing to pick: name a target or pass --control"),
            };
            match picked {
                Some(path) => {
                    println!("Picked {path}");
                    finish(&mut session, false).await
                }
                None => {
                    println!("Cancelled.");
                    Ok(())
                }
            }
        }
        EditorAction::Defaults { profile } => {
            let doc = template::default_for(&Profile::new(profile));
            println!("{}", serde_json::to_string_pretty(&doc.to_value()?)?);
            Ok(())
        }
    }
}

async fn finish(session: &mut EditorSession, dry_run: bool) -> Result<()> {
    if dry_run {
        println!("{}", serde_json::to_string_pretty(&session.payload()?)?);
        return Ok(());
    }
    match session.save().await? {
        SaveOutcome::Saved => println!("SAVED"),
        SaveOutcome::Retargeted { from, to } => println!("SAVED as {to} (was {from})"),
    }
    Ok(())
}

/// One `key=value` edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Field(FieldPath, String),
    SamplePrompt(usize, String),
    SampleParam(usize, String, String),
    ControlImage(usize, usize, String),
    Setting(String, String),
}

impl Assignment {
    pub fn parse(raw: &str) -> Result<Self> {
        let Some((key, value)) = raw.split_once('=') else {
            bail!("expected key=value, got {raw:?}");
        };
        let key = key.trim();
        let value = value.to_string();
        if let Some(path) = FieldPath::parse(key) {
            return Ok(Self::Field(path, value));
        }
        let Some(rest) = key.strip_prefix("samples.") else {
            return Ok(Self::Setting(key.to_string(), value));
        };
        let (index, name) = rest
            .split_once('.')
            .with_context(|| format!("expected samples.<index>.<name>, got {key}"))?;
        let index: usize = index
            .parse()
            .with_context(|| format!("bad sample index in {key}"))?;
        if name == "prompt" {
            return Ok(Self::SamplePrompt(index, value));
        }
        if let Some(slot) = name.strip_prefix("control.") {
            let slot = slot
                .parse()
                .with_context(|| format!("bad control slot in {key}"))?;
            return Ok(Self::ControlImage(index, slot, value));
        }
        Ok(Self::SampleParam(index, name.to_string(), value))
    }

    pub fn apply(&self, settings: &mut Settings, form: &mut EditorForm) -> Result<()> {
        match self {
            Self::Field(path, value) => form.set_from_text(*path, value)?,
            Self::SamplePrompt(index, value) => form.sample_mut(*index)?.prompt = value.clone(),
            Self::SampleParam(index, key, value) => form.sample_mut(*index)?.set_param(key, value)?,
            Self::ControlImage(index, slot, value) => {
                form.sample_mut(*index)?.set_control_image(*slot, value)?
            }
            Self::Setting(name, value) => settings.set(name, value)?,
        }
        Ok(())
    }
}

fn parse_slot(raw: &str) -> Result<(usize, usize)> {
    let (sample, slot) = raw
        .split_once(':')
        .with_context(|| format!("expected SAMPLE:SLOT, got {raw}"))?;
    Ok((
        sample.trim().parse().context("bad sample index")?,
        slot.trim().parse().context("bad control slot")?,
    ))
}

fn describe(session: &EditorSession) -> String {
    let form = session.form();
    let mut out = String::new();
    let source = match session.source() {
        DocumentSource::Persisted => "saved document",
        DocumentSource::Template => "profile template",
    };
    out.push_str(&format!(
        "task {} | profile {} ({}) | {source}\n",
        session.task_id(),
        form.profile(),
        form.shape()
    ));

    out.push_str("\n[settings]\n");
    for input in session.settings().inputs() {
        let value = match &input.control {
            SettingControl::Toggle(checked) => checked.to_string(),
            SettingControl::Text(text) | SettingControl::Select(text) => text.clone(),
        };
        let marker = if input.picker.is_some() { " *" } else { "" };
        out.push_str(&format!("  {} = {value}{marker}\n", input.name));
    }

    out.push_str("\n[document]\n");
    for field in form.fields() {
        let value = match &field.value {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Flag(checked) => checked.to_string(),
            FieldValue::Pair { width, height } => format!("{width}x{height}"),
        };
        out.push_str(&format!(
            "  {:<12} {} = {value}\n",
            field.spec.label, field.spec.path
        ));
    }

    for (index, sample) in form.samples().iter().enumerate() {
        out.push_str(&format!("\n[sample {index}]\n  prompt = {}\n", sample.prompt));
        let params: Vec<String> = sample
            .params()
            .iter()
            .map(|(param, value)| format!("{}={value}", param.label()))
            .collect();
        out.push_str(&format!("  {}\n", params.join(" ")));
        for (slot, path) in sample.control_images().iter().enumerate() {
            if !path.is_empty() {
                out.push_str(&format!("  control.{slot} = {path}\n"));
            }
        }
    }
    out
}
