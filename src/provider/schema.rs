use facet::Facet;

use crate::error::ProviderError;

use super::ResourceData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Set by the provider, never by the user.
    Computed,
    Required,
    Optional,
}

impl Presence {
    pub fn as_str(self) -> &'static str {
        match self {
            Presence::Computed => "computed",
            Presence::Required => "required",
            Presence::Optional => "optional",
        }
    }
}

/// One string-typed attribute of a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub presence: Presence,
    /// Changing the value replaces the resource.
    pub force_new: bool,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub attributes: Vec<Attribute>,
}

impl Schema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Check user-supplied attributes before create: required ones present,
    /// computed ones untouched, nothing unknown. Empty values count as unset.
    pub fn validate_config(&self, data: &ResourceData) -> Result<(), ProviderError> {
        for attr in &self.attributes {
            if attr.presence == Presence::Required && data.get(attr.name).is_none() {
                return Err(ProviderError::Validation {
                    message: format!("attribute '{}' is required", attr.name),
                });
            }
        }
        let set_keys = data
            .attributes
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, _)| key);
        for key in set_keys {
            match self.attribute(key) {
                None => {
                    return Err(ProviderError::Validation {
                        message: format!("unknown attribute '{key}'"),
                    });
                }
                Some(attr) if attr.presence == Presence::Computed => {
                    return Err(ProviderError::Validation {
                        message: format!("attribute '{key}' is computed and cannot be set"),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    pub fn describe(&self, resource_type: &str) -> SchemaJson {
        SchemaJson {
            resource_type: resource_type.to_string(),
            attributes: self
                .attributes
                .iter()
                .map(|a| AttributeJson {
                    name: a.name.to_string(),
                    presence: a.presence.as_str().to_string(),
                    force_new: a.force_new,
                    description: a.description.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Facet)]
pub struct SchemaJson {
    pub resource_type: String,
    pub attributes: Vec<AttributeJson>,
}

#[derive(Debug, Facet)]
pub struct AttributeJson {
    pub name: String,
    pub presence: String,
    pub force_new: bool,
    pub description: String,
}
