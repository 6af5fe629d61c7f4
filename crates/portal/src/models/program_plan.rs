//! Program plan step content.
//!
//! The portal does not model the full program-plan schema. Each step is
//! stored as an opaque JSON object of its form fields; the field lists below
//! only decide which inputs a step's form shows and which submitted keys are
//! kept.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use pengawas_core::WizardStep;

/// One input of a step form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Form field name and JSON key.
    pub name: &'static str,
    /// Label shown next to the input.
    pub label: &'static str,
    /// Render as a textarea instead of a single-line input.
    pub multiline: bool,
}

const fn line(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        multiline: false,
    }
}

const fn text(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        label,
        multiline: true,
    }
}

const ANALISIS: &[FieldSpec] = &[
    line("sekolah_binaan", "Sekolah binaan"),
    text("kondisi_sekolah", "Kondisi sekolah saat ini"),
    text("masalah_prioritas", "Masalah prioritas"),
    text("kebutuhan_pendampingan", "Kebutuhan pendampingan"),
];

const DOKUMEN: &[FieldSpec] = &[
    text("dokumen_dikaji", "Dokumen yang dikaji"),
    text("temuan", "Temuan kajian dokumen"),
];

const METODE: &[FieldSpec] = &[
    line("metode", "Metode pendampingan"),
    text("alasan", "Alasan pemilihan metode"),
];

const STRATEGI: &[FieldSpec] = &[
    text("strategi", "Strategi pelaksanaan"),
    line("jadwal", "Jadwal"),
    text("indikator_keberhasilan", "Indikator keberhasilan"),
];

const WAWANCARA: &[FieldSpec] = &[
    line("narasumber", "Narasumber"),
    text("ringkasan", "Ringkasan wawancara"),
];

/// The form fields of a step, in display order.
#[must_use]
pub const fn fields_for(step: WizardStep) -> &'static [FieldSpec] {
    match step {
        WizardStep::Analisis => ANALISIS,
        WizardStep::Dokumen => DOKUMEN,
        WizardStep::Metode => METODE,
        WizardStep::Strategi => STRATEGI,
        WizardStep::Wawancara => WAWANCARA,
    }
}

/// Saved content of one wizard step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepData(Map<String, Value>);

impl StepData {
    /// Build step content from a submitted form.
    ///
    /// Only the step's own fields are kept; values are trimmed and blank
    /// values are dropped.
    #[must_use]
    pub fn from_form(step: WizardStep, form: &HashMap<String, String>) -> Self {
        let map = fields_for(step)
            .iter()
            .filter_map(|field| {
                let value = form.get(field.name)?.trim();
                (!value.is_empty())
                    .then(|| (field.name.to_owned(), Value::String(value.to_owned())))
            })
            .collect();
        Self(map)
    }

    /// Text value of a field, or `""` if unset or not a string.
    #[must_use]
    pub fn field(&self, name: &str) -> &str {
        self.0.get(name).and_then(Value::as_str).unwrap_or_default()
    }
}
