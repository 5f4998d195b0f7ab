use serde::{Deserialize, Serialize};

use stockconf_core::{DomainError, DomainResult, Entity, ValidationErrors, ValueObject};

use crate::policy::SlugPolicy;

stockconf_core::record_id!(
    /// Category identifier.
    CategoryId,
    "category"
);

/// Maximum length of a category name (and of its slug).
pub const CATEGORY_NAME_MAX: usize = 100;

/// URL-friendly, unique handle derived from a category name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl ValueObject for Slug {}

impl Slug {
    /// Derive the slug for `name`.
    ///
    /// Fails when nothing sluggable remains (e.g. a name made only of symbols).
    pub fn from_name(name: &str) -> DomainResult<Self> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(DomainError::validation(
                "name",
                "must contain at least one letter or digit",
            ));
        }
        if slug.len() > CATEGORY_NAME_MAX {
            return Err(DomainError::validation(
                "name",
                format!("slug must be at most {CATEGORY_NAME_MAX} characters"),
            ));
        }
        Ok(Self(slug))
    }

    /// Wrap a slug loaded from storage as-is.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Turn free text into a slug.
///
/// Accented Latin letters are folded to ASCII and other non-ASCII characters
/// are dropped. The result keeps `[a-z0-9_]`, turns runs of whitespace and
/// hyphens into a single `-`, drops everything else, and trims `-`/`_` at both
/// ends.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.chars().flat_map(char::to_lowercase).filter_map(fold_ascii) {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else if c == '-' || c.is_ascii_whitespace() {
            pending_dash = true;
        }
    }

    out.trim_matches(|c| c == '-' || c == '_').to_string()
}

fn fold_ascii(c: char) -> Option<char> {
    if c.is_ascii() {
        return Some(c);
    }
    let folded = match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

/// Product category. `parent` links subcategories to their parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    pub parent: Option<CategoryId>,
}

impl Entity for Category {
    type Id = CategoryId;
    const ENTITY: &'static str = CategoryId::ENTITY;

    fn id(&self) -> CategoryId {
        self.id
    }
}

impl Category {
    pub fn from_new(id: CategoryId, new: NewCategory) -> Self {
        Self {
            id,
            name: new.name,
            slug: new.slug,
            parent: new.parent,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Rename, recomputing the slug only when the policy says so.
    pub fn rename(&mut self, name: String, policy: SlugPolicy) -> DomainResult<()> {
        if policy == SlugPolicy::Always {
            self.slug = Slug::from_name(&name)?;
        }
        self.name = name;
        Ok(())
    }
}

fn clean_name(raw: &str, errors: &mut ValidationErrors) -> String {
    let name = raw.trim().to_string();
    if name.is_empty() {
        errors.add("name", "cannot be empty");
    } else if name.chars().count() > CATEGORY_NAME_MAX {
        errors.add(
            "name",
            format!("must be at most {CATEGORY_NAME_MAX} characters"),
        );
    }
    name
}

/// Input for creating a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    #[serde(default)]
    pub parent: Option<CategoryId>,
}

impl CategoryInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: CategoryId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Validate and derive the slug. Uniqueness is checked against the store.
    pub fn clean(self) -> DomainResult<NewCategory> {
        let mut errors = ValidationErrors::new();
        let name = clean_name(&self.name, &mut errors);
        errors.into_result()?;

        let slug = Slug::from_name(&name)?;
        Ok(NewCategory {
            name,
            slug,
            parent: self.parent,
        })
    }
}

/// Validated category ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub slug: Slug,
    pub parent: Option<CategoryId>,
}

/// Input for editing a category.
///
/// `add_children` / `remove_children` carry the bulk subcategory edits made
/// from the category form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    pub name: String,
    #[serde(default)]
    pub parent: Option<CategoryId>,
    #[serde(default)]
    pub add_children: Vec<CategoryId>,
    #[serde(default)]
    pub remove_children: Vec<CategoryId>,
}

impl CategoryUpdate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            add_children: Vec::new(),
            remove_children: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: CategoryId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn adding(mut self, children: impl IntoIterator<Item = CategoryId>) -> Self {
        self.add_children.extend(children);
        self
    }

    pub fn removing(mut self, children: impl IntoIterator<Item = CategoryId>) -> Self {
        self.remove_children.extend(children);
        self
    }

    /// Field checks that need no stored state. Returns the trimmed name.
    pub fn clean_name(&self) -> DomainResult<String> {
        let mut errors = ValidationErrors::new();
        let name = clean_name(&self.name, &mut errors);

        if let Some(dup) = self
            .add_children
            .iter()
            .find(|c| self.remove_children.contains(c))
        {
            errors.add(
                "children",
                format!("category {dup} cannot be both added and removed"),
            );
        }

        errors.into_result()?;
        Ok(name)
    }
}
