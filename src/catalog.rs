use crate::card::CardInstance;
use crate::errors::{CatalogError, CatalogResult};
use rand::Rng;
use schema::{CardId, CardTemplate};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

const BUILTIN_CATALOG: &str = include_str!("../data/cards.ron");

// Built-in catalog, parsed once on first use
static BUILTIN: LazyLock<Arc<Catalog>> = LazyLock::new(|| {
    let catalog = Catalog::from_ron_str(BUILTIN_CATALOG)
        .unwrap_or_else(|err| panic!("Built-in card catalog is malformed: {}", err));
    Arc::new(catalog)
});

/// Immutable set of card templates that battles draw from.
#[derive(Debug, Clone)]
pub struct Catalog {
    templates: Vec<CardTemplate>,
    index: HashMap<CardId, usize>,
}

impl Catalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> Arc<Catalog> {
        Arc::clone(&BUILTIN)
    }

    pub fn new(templates: Vec<CardTemplate>) -> CatalogResult<Self> {
        if templates.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(templates.len());
        for (position, template) in templates.iter().enumerate() {
            if index.insert(template.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateTemplate(template.id.clone()));
            }
        }

        Ok(Self { templates, index })
    }

    pub fn from_ron_str(source: &str) -> CatalogResult<Self> {
        let templates: Vec<CardTemplate> = ron::from_str(source)?;
        Self::new(templates)
    }

    /// Load a catalog from a RON file on disk.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    pub fn get(&self, id: &CardId) -> Option<&CardTemplate> {
        self.index.get(id).map(|&position| &self.templates[position])
    }

    pub fn template(&self, id: &CardId) -> CatalogResult<&CardTemplate> {
        self.get(id)
            .ok_or_else(|| CatalogError::TemplateNotFound(id.clone()))
    }

    pub fn templates(&self) -> &[CardTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Create a fresh, unupgraded instance of the given template.
    pub fn instantiate(&self, id: &CardId) -> CatalogResult<CardInstance> {
        self.template(id).map(CardInstance::new)
    }

    /// Pick a template uniformly at random.
    pub fn random_template<R: Rng + ?Sized>(&self, rng: &mut R) -> &CardTemplate {
        &self.templates[rng.random_range(0..self.templates.len())]
    }
}
