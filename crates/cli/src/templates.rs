use std::error::Error;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use sensekit_core::shared::biometric::{BiometricModel, Modality};
use sensekit_core::shared::embedding::{decode_template, encode_template};

/// On-disk form of one enrolled template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct StoredTemplate {
    id: String,
    modality: Modality,
    embedding: Vec<f32>,
}

/// Reads every template of `modality` from a JSON template file.
pub fn load(path: &Path, modality: Modality) -> Result<Vec<BiometricModel>, Box<dyn Error>> {
    let stored = read_all(path)?;
    let models: Vec<BiometricModel> = stored
        .into_iter()
        .filter(|t| t.modality == modality)
        .map(|t| BiometricModel::new(t.id, t.modality, encode_template(&t.embedding)))
        .collect();
    log::info!(
        "Loaded {} {modality} templates from {}",
        models.len(),
        path.display()
    );
    Ok(models)
}

/// Adds `model` to the template file, replacing any entry with the same
/// id and modality. Creates the file if needed.
pub fn save(path: &Path, model: &BiometricModel) -> Result<(), Box<dyn Error>> {
    let mut stored = if path.exists() {
        read_all(path)?
    } else {
        Vec::new()
    };
    stored.retain(|t| !(t.id == model.id() && t.modality == model.modality()));
    stored.push(StoredTemplate {
        id: model.id().to_string(),
        modality: model.modality(),
        embedding: decode_template(model.template())?,
    });

    let json = serde_json::to_string_pretty(&stored)?;
    fs::write(path, json)
        .map_err(|e| format!("Cannot write templates {}: {e}", path.display()))?;
    log::info!("Saved {} template {:?} to {}", model.modality(), model.id(), path.display());
    Ok(())
}

fn read_all(path: &Path) -> Result<Vec<StoredTemplate>, Box<dyn Error>> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Cannot read templates {}: {e}", path.display()))?;
    let stored = serde_json::from_str(&json)
        .map_err(|e| format!("Cannot parse templates {}: {e}", path.display()))?;
    Ok(stored)
}
