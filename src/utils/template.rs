//! String template rendering utilities.

use std::collections::HashMap;

pub struct TemplateVars;

impl TemplateVars {
    pub const APPLICATION: &'static str = "application";
    pub const USER: &'static str = "user";
    pub const BUILD_NUM: &'static str = "buildNum";
    pub const ARTIFACT_URL: &'static str = "artifactUrl";
    pub const ARTIFACT_FILE: &'static str = "artifactFile";
    pub const RELEASE_DIR: &'static str = "releaseDir";
    pub const ENVIRONMENT: &'static str = "environment";
}

pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

pub fn render_map(template: &str, variables: &HashMap<String, String>) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

pub fn is_present(template: &str, key: &str) -> bool {
    let placeholder = format!("{{{{{}}}}}", key);
    template.contains(&placeholder)
}
