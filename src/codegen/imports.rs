use std::collections::BTreeSet;

/// The comment placed on the first provider import.
const PROVIDER_BINDINGS_HINT: &str = "/*Provider bindings are generated by running cdktf get.\nSee https://cdk.tf/provider-generation for more details.*/";

/// Computes the minimal import set for the emitted program. Providers and
/// modules are kept in first-use order; classes within one provider import
/// are sorted for stability.
#[derive(Debug, Default)]
pub struct ImportPlan {
    needs_core: bool,
    providers: Vec<ProviderImport>,
    modules: Vec<ModuleImport>,
    missing_schema: Vec<String>,
}

#[derive(Debug)]
struct ProviderImport {
    name: String,
    classes: BTreeSet<String>,
}

#[derive(Debug)]
struct ModuleImport {
    path: String,
    classes: BTreeSet<String>,
}

impl ImportPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Framework core is pulled in by backends, variables, outputs, token
    /// coercion, `Fn` calls, and framework-prefixed containers.
    pub fn require_core(&mut self) {
        self.needs_core = true;
    }

    pub fn require_provider_class(&mut self, provider: &str, class: &str) {
        if let Some(existing) = self.providers.iter_mut().find(|p| p.name == provider) {
            existing.classes.insert(class.to_string());
            return;
        }
        let mut classes = BTreeSet::new();
        classes.insert(class.to_string());
        self.providers.push(ProviderImport {
            name: provider.to_string(),
            classes,
        });
    }

    pub fn require_module_class(&mut self, path: &str, class: &str) {
        if let Some(existing) = self.modules.iter_mut().find(|m| m.path == path) {
            existing.classes.insert(class.to_string());
            return;
        }
        let mut classes = BTreeSet::new();
        classes.insert(class.to_string());
        self.modules.push(ModuleImport {
            path: path.to_string(),
            classes,
        });
    }

    /// Record a provider whose schema was absent from the catalog. The
    /// emitted program gets a leading comment listing them.
    pub fn note_missing_schema(&mut self, provider: &str) {
        if !self.missing_schema.iter().any(|p| p == provider) {
            self.missing_schema.push(provider.to_string());
        }
    }

    pub fn missing_schema(&self) -> &[String] {
        &self.missing_schema
    }

    /// Render the import statements. An empty program without a
    /// framework-prefixed container imports nothing at all.
    pub fn render(&self, code_container: &str, has_code: bool) -> String {
        let container_needs_core = code_container.starts_with("cdktf.");
        if !has_code
            && !self.needs_core
            && !container_needs_core
            && self.providers.is_empty()
            && self.modules.is_empty()
        {
            return String::new();
        }

        let mut lines = Vec::new();
        lines.push("import { Construct } from \"constructs\";".to_string());
        if self.needs_core || container_needs_core {
            lines.push("import * as cdktf from \"cdktf\";".to_string());
        }

        for (i, provider) in self.providers.iter().enumerate() {
            if i == 0 {
                lines.push(PROVIDER_BINDINGS_HINT.to_string());
            }
            let classes: Vec<&str> = provider.classes.iter().map(|c| c.as_str()).collect();
            lines.push(format!(
                "import {{ {} }} from \"./.gen/providers/{}\";",
                classes.join(", "),
                provider.name
            ));
        }

        for module in &self.modules {
            let classes: Vec<&str> = module.classes.iter().map(|c| c.as_str()).collect();
            lines.push(format!(
                "import {{ {} }} from \"./.gen/modules/{}\";",
                classes.join(", "),
                module.path
            ));
        }

        lines.join("\n")
    }
}
