use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    bundle::Bundle,
    errors::{GraphError, GraphErrors},
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

/// All loaded bundles, keyed by name
///
/// Traversal visits dependencies before their dependents. Bundles without a
/// dependency between them are visited in name order.
#[derive(Default, Debug)]
pub struct BundleGraph {
    map: BTreeMap<String, Bundle>,
}

impl BundleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bundle, returning the one it replaced
    pub fn insert(&mut self, bundle: Bundle) -> Option<Bundle> {
        self.map.insert(bundle.name().to_string(), bundle)
    }

    pub fn get(&self, name: &str) -> Result<&Bundle, GraphError> {
        self.map
            .get(name)
            .ok_or_else(|| GraphError::UnknownBundle(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Calls `visitor` once per bundle, after it was called for all of the bundle's dependencies
    ///
    /// Fails on the first unknown dependency or cycle. `visitor` may already have
    /// been called for some bundles at that point.
    pub fn traverse<'a>(&'a self, mut visitor: impl FnMut(&'a Bundle)) -> Result<(), GraphError> {
        let mut visits = HashMap::new();
        let mut chain = Vec::new();

        for bundle in self.map.values() {
            self.visit(bundle, &mut visits, &mut chain, &mut visitor)?;
        }

        Ok(())
    }

    fn visit<'a>(
        &'a self,
        bundle: &'a Bundle,
        visits: &mut HashMap<&'a str, Visit>,
        chain: &mut Vec<&'a str>,
        visitor: &mut impl FnMut(&'a Bundle),
    ) -> Result<(), GraphError> {
        let name = bundle.name();
        match visits.get(name) {
            Some(Visit::Done) => return Ok(()),
            Some(Visit::InProgress) => {
                let start = chain.iter().position(|entry| *entry == name).unwrap_or(0);
                return Err(circular(&chain[start..], name));
            }
            None => {}
        }

        visits.insert(name, Visit::InProgress);
        chain.push(name);

        for dependency in bundle.dependencies() {
            let next = self
                .map
                .get(dependency)
                .ok_or_else(|| GraphError::MissingDependency {
                    dependency: dependency.clone(),
                    required_by: name.to_string(),
                })?;

            self.visit(next, visits, chain, visitor)?;
        }

        visitor(bundle);

        chain.pop();
        visits.insert(name, Visit::Done);
        Ok(())
    }

    /// All bundles in traversal order
    pub fn ordered(&self) -> Result<Vec<&Bundle>, GraphError> {
        let mut ordered = Vec::with_capacity(self.map.len());
        self.traverse(|bundle| ordered.push(bundle))?;
        Ok(ordered)
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues, instead of stopping at the first one
    pub fn check(&self) -> Result<(), GraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();
        for bundle in self.map.values() {
            let mut chain = Vec::new();
            check_recurse(self, &mut checked, &mut errors, &mut chain, bundle);
        }

        if !errors.is_empty() {
            return Err(GraphErrors { errors });
        }

        return Ok(());

        fn check_recurse<'a>(
            graph: &'a BundleGraph,
            checked: &mut HashSet<&'a str>,
            errors: &mut Vec<GraphError>,
            chain: &mut Vec<&'a str>,
            bundle: &'a Bundle,
        ) {
            let name = bundle.name();

            if let Some(start) = chain.iter().position(|entry| *entry == name) {
                errors.push(circular(&chain[start..], name));
            }

            // Skip other checks if already checked
            if !checked.insert(name) {
                return;
            }

            chain.push(name);

            for dependency in bundle.dependencies() {
                let Some(next) = graph.map.get(dependency) else {
                    errors.push(GraphError::MissingDependency {
                        dependency: dependency.clone(),
                        required_by: name.to_string(),
                    });
                    continue;
                };

                check_recurse(graph, checked, errors, chain, next);
            }

            chain.pop();
        }
    }
}

/// Cycle error for `name`, reached again through `chain`
fn circular(chain: &[&str], name: &str) -> GraphError {
    GraphError::CircularDependency {
        name: name.to_string(),
        chain: chain
            .iter()
            .copied()
            .chain([name])
            .map(str::to_string)
            .collect(),
    }
}
