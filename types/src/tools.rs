use std::collections::BTreeMap;

/// A group of function declarations offered to the model.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Tool {
    /// Sent in snake case, unlike the rest of the setup message.
    function_declarations: Vec<FunctionDeclaration>,
}

impl Tool {
    pub fn new(function_declarations: Vec<FunctionDeclaration>) -> Self {
        Self {
            function_declarations,
        }
    }

    pub fn function_declarations(&self) -> &[FunctionDeclaration] {
        &self.function_declarations
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FunctionDeclaration {
    /// The name of the function
    name: String,

    /// The description of the function
    description: String,

    /// The parameters of the function
    parameters: Parameters,
}

impl FunctionDeclaration {
    pub fn new(name: &str, description: &str, parameters: Parameters) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Parameters {
    #[serde(rename = "type")]
    param_type: String,
    properties: BTreeMap<String, Property>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<Vec<String>>,
}

impl Parameters {
    /// An `OBJECT` schema with no properties yet.
    pub fn object() -> Self {
        Self {
            param_type: "OBJECT".to_string(),
            properties: BTreeMap::new(),
            required: None,
        }
    }

    pub fn with_property(mut self, name: &str, property: Property) -> Self {
        self.properties.insert(name.to_string(), property);
        self
    }

    pub fn with_required(mut self, required: Vec<String>) -> Self {
        self.required = Some(required);
        self
    }

    pub fn param_type(&self) -> &str {
        &self.param_type
    }

    pub fn properties(&self) -> &BTreeMap<String, Property> {
        &self.properties
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Property {
    #[serde(rename = "type")]
    property_type: String,
    description: String,
}

impl Property {
    pub fn new(property_type: &str, description: &str) -> Self {
        Self {
            property_type: property_type.to_string(),
            description: description.to_string(),
        }
    }

    pub fn property_type(&self) -> &str {
        &self.property_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
