//! Rego evaluation through `regorus`.

#![forbid(unsafe_code)]

use clusterguard_domain::{
    EngineError, ModuleSet, PolicyNamespace, RawExpression, RawResult, RuleEngine,
};
use clusterguard_types::RuleFile;
use serde_json::Value as JsonValue;
use tracing::debug;

/// Stateless adapter: every call works on its own `regorus::Engine`.
#[derive(Clone, Debug)]
pub struct RegoEngine {
    namespace: PolicyNamespace,
    query: String,
}

impl RegoEngine {
    pub fn new(namespace: &PolicyNamespace) -> Self {
        Self {
            namespace: namespace.clone(),
            query: namespace.query(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

impl RuleEngine for RegoEngine {
    fn validate(&self, file: &RuleFile) -> Result<(), String> {
        let mut engine = regorus::Engine::new();
        engine
            .add_policy(file.path.to_string(), file.content.clone())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn evaluate(
        &self,
        modules: &ModuleSet,
        input: &JsonValue,
    ) -> Result<Vec<RawResult>, EngineError> {
        let mut engine = regorus::Engine::new();
        for module in modules.runtime_modules() {
            debug!(path = %module.path, package = %module.package, "loading module");
            engine
                .add_policy(module.path.to_string(), module.source.clone())
                .map_err(|e| EngineError::Load {
                    path: module.path.clone(),
                    message: e.to_string(),
                })?;
        }

        let input = regorus::Value::from_json_str(&input.to_string())
            .map_err(|e| EngineError::Input(e.to_string()))?;
        engine.set_input(input);

        let results = engine
            .eval_query(self.query.clone(), false)
            .map_err(|e| EngineError::Eval(e.to_string()))?;
        debug!(query = %self.query, results = results.result.len(), "query evaluated");

        let raw = results
            .result
            .into_iter()
            .map(|r| {
                let expressions = r
                    .expressions
                    .iter()
                    .map(|e| {
                        Ok(RawExpression {
                            value: to_json(&e.value)?,
                            text: e.text.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, EngineError>>()?;
                let bindings = match to_json(&r.bindings)? {
                    Some(JsonValue::Object(map)) => Some(map),
                    _ => None,
                };
                Ok(RawResult {
                    expressions,
                    bindings,
                })
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        Ok(raw
            .into_iter()
            .filter(|r| !self.is_package_node(modules, r))
            .collect())
    }
}

impl RegoEngine {
    /// The query also enumerates intermediate packages of nested modules
    /// (`<ns>.lib` for `<ns>.lib.utils`). Those are not policy results.
    fn is_package_node(&self, modules: &ModuleSet, raw: &RawResult) -> bool {
        let Some(name) = raw
            .bindings
            .as_ref()
            .and_then(|b| b.get("name"))
            .and_then(JsonValue::as_str)
        else {
            return false;
        };
        let identity = self.namespace.qualify(name);
        let prefix = format!("{identity}.");
        let packages: Vec<&str> = modules.runtime_modules().map(|m| m.package.as_str()).collect();
        let is_node = !packages.contains(&identity.as_str())
            && packages.iter().any(|p| p.starts_with(&prefix));
        if is_node {
            debug!(package = %identity, "skipping intermediate package result");
        }
        is_node
    }
}

/// `None` for undefined values; everything else goes through serde.
fn to_json(value: &regorus::Value) -> Result<Option<JsonValue>, EngineError> {
    if matches!(value, regorus::Value::Undefined) {
        return Ok(None);
    }
    serde_json::to_value(value)
        .map(Some)
        .map_err(|e| EngineError::Eval(format!("unrepresentable result value: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clusterguard_domain::{PolicyAgent, compile, evaluate};
    use clusterguard_types::ids;
    use serde_json::json;

    const LOGGING: &str = r#"# METADATA
# title: Control plane logging
# description: Clusters ship control plane logs
# custom:
#   group: Security
package gke.policy.logging

import rego.v1

default valid := false

valid if {
	count(violation) == 0
}

violation contains msg if {
	not input.logging.enabled
	msg := sprintf("cluster %s has not enabled logging", [input.name])
}
"#;

    const LOGGING_TEST: &str = r#"package gke.policy.logging_test

import rego.v1

test_disabled if {
	not data.gke.policy.logging.valid with input as {"name": "c", "logging": {"enabled": false}}
}
"#;

    fn file(path: &str, content: &str) -> RuleFile {
        RuleFile::new(path, path, content)
    }

    fn namespace() -> PolicyNamespace {
        PolicyNamespace::new("gke.policy")
    }

    #[test]
    fn validate_reports_syntax_errors() {
        let engine = RegoEngine::new(&namespace());
        assert!(engine.validate(&file("ok.rego", LOGGING)).is_ok());
        let err = engine
            .validate(&file("bad.rego", "package gke.policy.bad\n\nvalid := {"))
            .unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn query_targets_the_namespace() {
        assert_eq!(RegoEngine::new(&namespace()).query(), "data.gke.policy[name]");
    }

    #[test]
    fn evaluates_policies_against_input() {
        let engine = RegoEngine::new(&namespace());
        let mut agent = PolicyAgent::new(engine, namespace());
        agent
            .compile(&[file("logging.rego", LOGGING), file("logging_test.rego", LOGGING_TEST)])
            .expect("compile");

        let result = agent
            .evaluate(&json!({ "name": "prod", "logging": { "enabled": false } }))
            .expect("evaluate");
        let violated = result.violated("Security");
        assert_eq!(violated.len(), 1, "{result:?}");
        assert_eq!(violated[0].name, "gke.policy.logging");
        assert_eq!(
            violated[0].violations,
            vec!["cluster prod has not enabled logging"]
        );
        assert_eq!(result.errored_count(), 0);

        let result = agent
            .evaluate(&json!({ "name": "prod", "logging": { "enabled": true } }))
            .expect("evaluate");
        assert_eq!(result.valid("Security").len(), 1);
        assert_eq!(result.violated_count(), 0);
    }

    #[test]
    fn policy_without_valid_rule_is_errored() {
        let source = LOGGING
            .replace("default valid := false\n\nvalid if {\n\tcount(violation) == 0\n}\n", "");
        let engine = RegoEngine::new(&namespace());
        let mut agent = PolicyAgent::new(engine, namespace());
        agent.compile(&[file("logging.rego", &source)]).expect("compile");

        let result = agent
            .evaluate(&json!({ "name": "prod", "logging": { "enabled": false } }))
            .expect("evaluate");
        assert_eq!(result.errored_count(), 1);
        assert_eq!(
            result.errored()[0].processing_errors[0].code,
            ids::CODE_INVALID_RESULT_SHAPE
        );
    }

    #[test]
    fn test_modules_are_not_loaded_for_evaluation() {
        let engine = RegoEngine::new(&namespace());
        let modules = compile(
            &[file("logging.rego", LOGGING), file("logging_test.rego", LOGGING_TEST)],
            &engine,
            &namespace(),
        )
        .expect("compile");

        let raw = engine.evaluate(&modules, &json!({})).expect("evaluate");
        let names: Vec<_> = raw
            .iter()
            .filter_map(|r| r.bindings.as_ref()?.get("name").cloned())
            .collect();
        assert_eq!(names, vec![json!("logging")]);
    }

    fn nested_logging() -> String {
        LOGGING.replace("package gke.policy.logging", "package gke.policy.gke.logging")
    }

    #[test]
    fn nested_packages_are_neither_policies_nor_results() {
        let mut agent = PolicyAgent::new(RegoEngine::new(&namespace()), namespace());
        let compiled = agent
            .compile(&[
                file("logging.rego", LOGGING),
                file("gke/logging.rego", &nested_logging()),
            ])
            .expect("compile");
        let names: Vec<&str> = compiled.policies().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["gke.policy.logging"]);

        let result = agent
            .evaluate(&json!({ "name": "prod", "logging": { "enabled": true } }))
            .expect("evaluate");
        assert_eq!(result.valid_count(), 1, "{result:?}");
        assert_eq!(result.violated_count(), 0);
        assert_eq!(result.errored_count(), 0, "{result:?}");
    }

    #[test]
    fn incomplete_metadata_policy_is_not_evaluated() {
        let ungrouped = LOGGING
            .replace("# custom:\n#   group: Security\n", "")
            .replace("package gke.policy.logging", "package gke.policy.ungrouped");
        let engine = RegoEngine::new(&namespace());
        let mut agent = PolicyAgent::new(engine, namespace());
        let compiled = agent
            .compile(&[file("logging.rego", LOGGING), file("ungrouped.rego", &ungrouped)])
            .expect("compile");
        assert_eq!(compiled.metadata_errors().len(), 1);

        let raw = agent
            .engine()
            .evaluate(compiled.evaluation_modules(), &json!({}))
            .expect("evaluate");
        let names: Vec<_> = raw
            .iter()
            .filter_map(|r| r.bindings.as_ref()?.get("name").cloned())
            .collect();
        assert_eq!(names, vec![json!("logging")]);

        let result = agent
            .evaluate(&json!({ "name": "prod", "logging": { "enabled": false } }))
            .expect("evaluate");
        assert_eq!(result.total(), 1);
        assert_eq!(result.violated_count(), 1);
        assert_eq!(result.errored_count(), 0);
    }

    #[test]
    fn one_snapshot_serves_concurrent_evaluations() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RegoEngine>();

        let engine = RegoEngine::new(&namespace());
        let mut agent = PolicyAgent::new(engine.clone(), namespace());
        let compiled = agent
            .compile(&[file("logging.rego", LOGGING)])
            .expect("compile");

        let inputs: Vec<_> = (0..4)
            .map(|i| json!({ "name": format!("c{i}"), "logging": { "enabled": i % 2 == 0 } }))
            .collect();
        let sequential: Vec<_> = inputs
            .iter()
            .map(|input| evaluate(&compiled, &engine, input).expect("evaluate"))
            .collect();

        let concurrent: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = inputs
                .iter()
                .map(|input| {
                    let compiled = &compiled;
                    let engine = &engine;
                    scope.spawn(move || evaluate(compiled, engine, input).expect("evaluate"))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("thread panicked"))
                .collect()
        });

        assert_eq!(concurrent, sequential);
        assert_eq!(concurrent[0].valid_count(), 1);
        assert_eq!(
            concurrent[1].violated("Security")[0].violations,
            vec!["cluster c1 has not enabled logging"]
        );
    }
}
