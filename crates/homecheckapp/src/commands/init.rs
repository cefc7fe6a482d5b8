use std::path::Path;

use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::{AppSettings, PropertyType, Template, SETTINGS_ID};
use crate::store::backend::StorageBackend;
use crate::store::LocalStore;

/// What [`LocalStore::init`] wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub templates: usize,
    pub settings: bool,
}

impl<B: StorageBackend> LocalStore<B> {
    /// Bring a store to its ready state: seed starter templates when there are
    /// none, and default settings when they are missing.
    ///
    /// Seeds are local defaults, not user edits, so nothing is enqueued for
    /// sync. Safe to call on every start.
    pub fn init(&self) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        if self.count::<Template>()? == 0 {
            report.templates = self.bulk_put(&default_templates())?;
            tracing::info!(count = report.templates, "seeded default templates");
        }
        if self.get::<AppSettings>(SETTINGS_ID)?.is_none() {
            self.put(&AppSettings::default())?;
            report.settings = true;
        }
        Ok(report)
    }
}

pub fn run<B: StorageBackend>(
    store: &LocalStore<B>,
    data_dir: &Path,
    seed_defaults: bool,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    if seed_defaults {
        let report = store.init()?;
        if report.templates > 0 {
            result.add_message(CmdMessage::info(format!(
                "Added {} starter templates",
                report.templates
            )));
        }
    }

    result.add_message(CmdMessage::success(format!(
        "Initialized homecheck store at {}",
        data_dir.display()
    )));
    Ok(result)
}

/// Starter checklists for an empty store.
pub fn default_templates() -> Vec<Template> {
    let shared: &[(&str, &[&str])] = &[
        (
            "Entry",
            &["Front door and locks", "Walls and ceiling", "Flooring", "Lighting"],
        ),
        (
            "Kitchen",
            &[
                "Sink and faucet",
                "Stove and oven",
                "Refrigerator",
                "Cabinets and counters",
                "Flooring",
            ],
        ),
        (
            "Bathroom",
            &[
                "Toilet",
                "Sink and faucet",
                "Shower or tub",
                "Ventilation",
                "Flooring",
            ],
        ),
        (
            "Bedroom",
            &["Walls and ceiling", "Windows and blinds", "Closet", "Flooring"],
        ),
    ];
    let house_extra: &[(&str, &[&str])] = &[
        ("Living Room", &["Walls and ceiling", "Windows", "Flooring", "Outlets"]),
        ("Exterior", &["Roof and gutters", "Siding", "Yard", "Garage"]),
        ("Utilities", &["Water heater", "Furnace and filter", "Smoke detectors"]),
    ];

    vec![
        build_template("Standard Apartment", PropertyType::Apartment, shared),
        build_template(
            "Single-Family House",
            PropertyType::House,
            &[shared, house_extra].concat(),
        ),
    ]
}

fn build_template(name: &str, property_type: PropertyType, sections: &[(&str, &[&str])]) -> Template {
    let mut template = Template::new(name, property_type);
    for (section_name, items) in sections {
        let section_id = template.add_section(*section_name);
        if let Some(section) = template.section_mut(&section_id) {
            for item in *items {
                section.add_item(*item);
            }
        }
    }
    template
}
