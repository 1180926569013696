//! Declaration planning.
//!
//! The planner builds the reference graph of a [`DefinitionTable`], assigns
//! every definition to a [`Section`], and computes the emission order:
//!
//! - strongly connected components of the reference graph are ordered with
//!   Kahn's algorithm, ties broken by (section rank, declaration index);
//! - inside a component, records come first (they may carry forward
//!   references), then unions and aliases in dependency order;
//! - every reference to a definition that is not yet emitted when its user
//!   is emitted is recorded as a forward reference.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashSet};
use std::fmt;
use std::str::FromStr;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::GenerateError;
use crate::ir::{DefinitionKind, DefinitionTable};

/// Output category of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    /// Enum definitions
    Enums,
    /// Members of unions whose members reach no union, and records using them
    Actions,
    /// Records that reach no union
    Props,
    /// Union aliases
    Unions,
    /// Records and aliases that are part of, or reach, a recursive union
    Components,
    /// Metadata record and the top-level schema type
    Schema,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Enums,
        Section::Actions,
        Section::Props,
        Section::Unions,
        Section::Components,
        Section::Schema,
    ];

    /// Configuration tag.
    pub fn tag(self) -> &'static str {
        match self {
            Section::Enums => "enums",
            Section::Actions => "actions",
            Section::Props => "props",
            Section::Unions => "unions",
            Section::Components => "components",
            Section::Schema => "schema",
        }
    }

    /// Banner title used by the generators.
    pub fn title(self) -> &'static str {
        match self {
            Section::Enums => "ENUMS",
            Section::Actions => "ACTIONS",
            Section::Props => "PROPS",
            Section::Unions => "UNIONS",
            Section::Components => "COMPONENTS",
            Section::Schema => "TOP-LEVEL SCHEMA",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Section {
    type Err = SectionOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.tag() == s)
            .ok_or_else(|| SectionOrderError::Unknown(s.to_string()))
    }
}

/// Invalid section ordering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionOrderError {
    #[error("unknown section '{0}'")]
    Unknown(String),

    #[error("section '{0}' is missing")]
    Missing(Section),

    #[error("section '{0}' is listed more than once")]
    Duplicate(Section),
}

/// Ordered list of sections: the emission order policy.
///
/// Each section appears exactly once. The order only breaks ties between
/// declarations that are ready at the same time; dependencies always win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOrder(Vec<Section>);

impl SectionOrder {
    pub fn new(order: Vec<Section>) -> Result<Self, SectionOrderError> {
        let mut seen = HashSet::new();
        for section in &order {
            if !seen.insert(*section) {
                return Err(SectionOrderError::Duplicate(*section));
            }
        }
        if let Some(missing) = Section::ALL.into_iter().find(|s| !seen.contains(s)) {
            return Err(SectionOrderError::Missing(missing));
        }
        Ok(Self(order))
    }

    /// Parse a list of configuration tags.
    pub fn parse<S: AsRef<str>>(tags: &[S]) -> Result<Self, SectionOrderError> {
        let order = tags
            .iter()
            .map(|tag| tag.as_ref().parse())
            .collect::<Result<Vec<Section>, _>>()?;
        Self::new(order)
    }

    pub fn rank(&self, section: Section) -> usize {
        self.0
            .iter()
            .position(|s| *s == section)
            .unwrap_or(self.0.len())
    }

    pub fn sections(&self) -> &[Section] {
        &self.0
    }
}

impl Default for SectionOrder {
    fn default() -> Self {
        Self(Section::ALL.to_vec())
    }
}

/// One definition in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDefinition {
    pub name: String,

    /// Emission category
    pub section: Section,

    /// Category used for the public export list (unions are grouped with
    /// the records they unite)
    pub export_group: Section,

    /// Referenced definitions, in first-occurrence order
    pub dependencies: Vec<String>,

    /// References to definitions not yet emitted at this point (including
    /// self references)
    pub forward_refs: BTreeSet<String>,
}

impl PlannedDefinition {
    pub fn is_forward(&self, name: &str) -> bool {
        self.forward_refs.contains(name)
    }
}

/// Emission plan for a whole table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub items: Vec<PlannedDefinition>,
}

impl Plan {
    pub fn get(&self, name: &str) -> Option<&PlannedDefinition> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|item| item.name == name)
    }

    /// Definitions that carry at least one forward reference, in emission order.
    pub fn forward_referencing(&self) -> impl Iterator<Item = &PlannedDefinition> {
        self.items.iter().filter(|item| !item.forward_refs.is_empty())
    }
}

/// Build the emission plan for `table`.
pub fn plan(table: &DefinitionTable, order: &SectionOrder) -> Result<Plan, GenerateError> {
    let graph = reference_graph(table)?;

    for target in [&table.root.metadata_type, &table.root.root_type] {
        if !table.contains(target) {
            return Err(GenerateError::unresolved(target.as_str(), table.root.name.as_str()));
        }
    }

    let sections = classify(table, &graph);
    let order_keys: Vec<(usize, usize)> = sections
        .iter()
        .enumerate()
        .map(|(index, (section, _))| (order.rank(*section), index))
        .collect();

    let sequence = emission_sequence(table, &graph, &order_keys)?;

    let mut emitted: HashSet<usize> = HashSet::with_capacity(sequence.len());
    let mut items = Vec::with_capacity(sequence.len());
    for index in sequence {
        let Some(definition) = table.get_index(index) else {
            return Err(GenerateError::internal(
                index.to_string(),
                "planned index outside the definition table",
            ));
        };
        let dependencies: Vec<String> = definition
            .references()
            .into_iter()
            .map(str::to_string)
            .collect();
        let forward_refs = dependencies
            .iter()
            .filter(|dep| table.index_of(dep).is_some_and(|i| !emitted.contains(&i)))
            .cloned()
            .collect::<BTreeSet<_>>();

        let (section, export_group) = sections[index];
        tracing::trace!(
            name = %definition.name,
            section = %section,
            forward = forward_refs.len(),
            "planned definition"
        );

        emitted.insert(index);
        items.push(PlannedDefinition {
            name: definition.name.clone(),
            section,
            export_group,
            dependencies,
            forward_refs,
        });
    }

    tracing::debug!(definitions = items.len(), "emission order planned");
    Ok(Plan { items })
}

/// Graph over declaration indices; an edge `a -> b` means `a` references `b`.
fn reference_graph(table: &DefinitionTable) -> Result<DiGraph<usize, ()>, GenerateError> {
    let mut graph = DiGraph::with_capacity(table.len(), 0);
    for index in 0..table.len() {
        graph.add_node(index);
    }

    for (index, definition) in table.iter().enumerate() {
        for reference in definition.references() {
            let target = table
                .index_of(reference)
                .ok_or_else(|| GenerateError::unresolved(reference, definition.name.as_str()))?;
            graph.add_edge(NodeIndex::new(index), NodeIndex::new(target), ());
        }
    }

    Ok(graph)
}

/// Union indices reachable from `start` through at least one edge.
fn reachable_unions(
    table: &DefinitionTable,
    graph: &DiGraph<usize, ()>,
    start: usize,
) -> BTreeSet<usize> {
    let mut found = BTreeSet::new();
    for next in graph.neighbors_directed(NodeIndex::new(start), Direction::Outgoing) {
        let mut dfs = Dfs::new(graph, next);
        while let Some(node) = dfs.next(graph) {
            if table.get_index(node.index()).is_some_and(|d| d.is_union()) {
                found.insert(node.index());
            }
        }
    }
    found
}

/// Assign (section, export group) to every definition, by declaration index.
fn classify(table: &DefinitionTable, graph: &DiGraph<usize, ()>) -> Vec<(Section, Section)> {
    let reach: Vec<BTreeSet<usize>> = (0..table.len())
        .map(|index| reachable_unions(table, graph, index))
        .collect();

    // A leaf union has members that are neither unions nor reach one.
    let leaf_unions: HashSet<usize> = table
        .iter()
        .enumerate()
        .filter_map(|(index, definition)| {
            let union = definition.as_union()?;
            union
                .members
                .iter()
                .filter_map(|member| table.index_of(member))
                .all(|m| !table.get_index(m).is_some_and(|d| d.is_union()) && reach[m].is_empty())
                .then_some(index)
        })
        .collect();

    let mut member_of_leaf = HashSet::new();
    let mut member_of_recursive = HashSet::new();
    for (index, definition) in table.iter().enumerate() {
        if let Some(union) = definition.as_union() {
            let target = if leaf_unions.contains(&index) {
                &mut member_of_leaf
            } else {
                &mut member_of_recursive
            };
            target.extend(union.members.iter().filter_map(|m| table.index_of(m)));
        }
    }

    table
        .iter()
        .enumerate()
        .map(|(index, definition)| {
            if definition.name == table.root.metadata_type {
                return (Section::Schema, Section::Schema);
            }
            match &definition.kind {
                DefinitionKind::Enum(_) => (Section::Enums, Section::Enums),
                DefinitionKind::Union(_) if leaf_unions.contains(&index) => {
                    (Section::Unions, Section::Actions)
                }
                DefinitionKind::Union(_) => (Section::Unions, Section::Components),
                DefinitionKind::Object(_) | DefinitionKind::Alias(_) => {
                    let reaches_recursive = reach[index].iter().any(|u| !leaf_unions.contains(u));
                    let section = if member_of_recursive.contains(&index) || reaches_recursive {
                        Section::Components
                    } else if member_of_leaf.contains(&index) || !reach[index].is_empty() {
                        Section::Actions
                    } else {
                        Section::Props
                    };
                    (section, section)
                }
            }
        })
        .collect()
}

/// Declaration indices in emission order.
fn emission_sequence(
    table: &DefinitionTable,
    graph: &DiGraph<usize, ()>,
    keys: &[(usize, usize)],
) -> Result<Vec<usize>, GenerateError> {
    let components = tarjan_scc(graph);
    let mut component_of = vec![0usize; table.len()];
    for (id, component) in components.iter().enumerate() {
        for node in component {
            component_of[node.index()] = id;
        }
    }

    // Condensation edges, from a dependency to its dependents.
    let mut dependents: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); components.len()];
    let mut pending = vec![0usize; components.len()];
    for edge in graph.raw_edges() {
        let (from, to) = (
            component_of[edge.source().index()],
            component_of[edge.target().index()],
        );
        if from != to && dependents[to].insert(from) {
            pending[from] += 1;
        }
    }

    let priority = |id: usize| {
        components[id]
            .iter()
            .map(|node| keys[node.index()])
            .min()
            .unwrap_or((usize::MAX, usize::MAX))
    };

    let mut ready: BinaryHeap<Reverse<((usize, usize), usize)>> = (0..components.len())
        .filter(|id| pending[*id] == 0)
        .map(|id| Reverse((priority(id), id)))
        .collect();

    let mut sequence = Vec::with_capacity(table.len());
    while let Some(Reverse((_, id))) = ready.pop() {
        sequence.extend(order_component(table, graph, &components[id], keys)?);
        for &dependent in &dependents[id] {
            pending[dependent] -= 1;
            if pending[dependent] == 0 {
                ready.push(Reverse((priority(dependent), dependent)));
            }
        }
    }

    Ok(sequence)
}

/// Order the members of one strongly connected component.
fn order_component(
    table: &DefinitionTable,
    graph: &DiGraph<usize, ()>,
    component: &[NodeIndex],
    keys: &[(usize, usize)],
) -> Result<Vec<usize>, GenerateError> {
    let is_object = |index: usize| table.get_index(index).is_some_and(|d| d.is_object());

    let mut records: Vec<usize> = component
        .iter()
        .map(|n| n.index())
        .filter(|i| is_object(*i))
        .collect();
    records.sort_by_key(|i| keys[*i]);

    let mut rest: BTreeSet<usize> = component
        .iter()
        .map(|n| n.index())
        .filter(|i| !is_object(*i))
        .collect();

    let mut ordered = records;
    while !rest.is_empty() {
        // Next alias / union whose in-component alias and union deps are done.
        let next = rest
            .iter()
            .copied()
            .filter(|index| {
                graph
                    .neighbors_directed(NodeIndex::new(*index), Direction::Outgoing)
                    .all(|dep| !rest.contains(&dep.index()))
            })
            .min_by_key(|index| keys[*index]);

        match next {
            Some(index) => {
                rest.remove(&index);
                ordered.push(index);
            }
            None => return Err(circular(table, graph, &rest)),
        }
    }

    Ok(ordered)
}

/// Describe a cycle that runs only through unions and aliases.
fn circular(
    table: &DefinitionTable,
    graph: &DiGraph<usize, ()>,
    remaining: &BTreeSet<usize>,
) -> GenerateError {
    let name = |index: usize| {
        table
            .get_index(index)
            .map(|d| d.name.clone())
            .unwrap_or_default()
    };

    let mut path: Vec<usize> = Vec::new();
    let mut current = remaining.iter().next().copied();
    while let Some(index) = current {
        if let Some(start) = path.iter().position(|p| *p == index) {
            let mut cycle: Vec<String> = path[start..].iter().map(|i| name(*i)).collect();
            cycle.push(name(index));
            return GenerateError::CircularDependency { cycle };
        }
        path.push(index);
        current = graph
            .neighbors_directed(NodeIndex::new(index), Direction::Outgoing)
            .map(|n| n.index())
            .find(|n| remaining.contains(n));
    }

    GenerateError::CircularDependency {
        cycle: path.into_iter().map(name).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{
        AliasDef, Definition, EnumDef, ObjectDef, PrimitiveKind, PropertySpec, SchemaRoot,
        UnionDef,
    };

    fn object(name: &str, fields: &[(&str, PropertySpec)]) -> Definition {
        let object = fields
            .iter()
            .fold(ObjectDef::new(), |o, (field, spec)| o.with_required(*field, spec.clone()));
        Definition::new(name, DefinitionKind::Object(object))
    }

    fn union(name: &str, members: &[&str]) -> Definition {
        Definition::new(
            name,
            DefinitionKind::Union(UnionDef::new(members.iter().copied()).with_discriminator("type")),
        )
    }

    fn string() -> PropertySpec {
        PropertySpec::primitive(PrimitiveKind::String)
    }

    fn names(plan: &Plan) -> Vec<&str> {
        plan.items.iter().map(|i| i.name.as_str()).collect()
    }

    /// Small version of the UI component tree: an action union, props, and a
    /// recursive component union.
    fn ui_table() -> DefinitionTable {
        DefinitionTable::new(SchemaRoot::default())
            .with(object(
                "UIMetadata",
                &[("title", string())],
            ))
            .with(union("UIComponent", &["ButtonComponent", "CardComponent"]))
            .with(object(
                "CardComponent",
                &[
                    ("type", PropertySpec::constant("card")),
                    ("props", PropertySpec::reference("CardProps")),
                    ("children", PropertySpec::array(PropertySpec::reference("UIComponent"))),
                ],
            ))
            .with(object(
                "ButtonComponent",
                &[
                    ("type", PropertySpec::constant("button")),
                    ("props", PropertySpec::reference("ButtonProps")),
                    ("onClick", PropertySpec::reference("EventAction")),
                ],
            ))
            .with(object("CardProps", &[("title", string())]))
            .with(object(
                "ButtonProps",
                &[("size", PropertySpec::reference("ButtonSize"))],
            ))
            .with(union("EventAction", &["NavigateAction", "CustomAction"]))
            .with(object(
                "NavigateAction",
                &[("type", PropertySpec::constant("navigate")), ("to", string())],
            ))
            .with(object("CustomAction", &[("type", PropertySpec::constant("custom"))]))
            .with(Definition::new(
                "ButtonSize",
                DefinitionKind::Enum(EnumDef::new(["sm", "md"])),
            ))
    }

    // ========================================================================
    // Section order
    // ========================================================================

    #[test]
    fn test_section_order_validation() {
        assert!(SectionOrder::parse(&["enums", "actions", "props", "unions", "components", "schema"]).is_ok());
        assert_eq!(
            SectionOrder::parse(&["enums", "actions"]),
            Err(SectionOrderError::Missing(Section::Props))
        );
        assert_eq!(
            SectionOrder::parse(&["enums", "enums"]),
            Err(SectionOrderError::Duplicate(Section::Enums))
        );
        assert_eq!(
            SectionOrder::parse(&["widgets"]),
            Err(SectionOrderError::Unknown("widgets".into()))
        );
    }

    // ========================================================================
    // Classification
    // ========================================================================

    #[test]
    fn test_sections_are_structural() {
        let plan = plan(&ui_table(), &SectionOrder::default()).unwrap();
        let section = |name: &str| plan.get(name).unwrap().section;
        let group = |name: &str| plan.get(name).unwrap().export_group;

        assert_eq!(section("ButtonSize"), Section::Enums);
        assert_eq!(section("NavigateAction"), Section::Actions);
        assert_eq!(section("CustomAction"), Section::Actions);
        assert_eq!(section("CardProps"), Section::Props);
        assert_eq!(section("ButtonProps"), Section::Props);
        assert_eq!(section("EventAction"), Section::Unions);
        assert_eq!(group("EventAction"), Section::Actions);
        assert_eq!(section("UIComponent"), Section::Unions);
        assert_eq!(group("UIComponent"), Section::Components);
        assert_eq!(section("CardComponent"), Section::Components);
        assert_eq!(section("ButtonComponent"), Section::Components);
        assert_eq!(section("UIMetadata"), Section::Schema);
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    #[test]
    fn test_default_order() {
        let plan = plan(&ui_table(), &SectionOrder::default()).unwrap();
        assert_eq!(
            names(&plan),
            vec![
                "ButtonSize",
                "NavigateAction",
                "CustomAction",
                "CardProps",
                "ButtonProps",
                "EventAction",
                "ButtonComponent",
                "CardComponent",
                "UIComponent",
                "UIMetadata",
            ]
        );
    }

    #[test]
    fn test_recursive_card_uses_forward_reference() {
        let plan = plan(&ui_table(), &SectionOrder::default()).unwrap();
        let card = plan.get("CardComponent").unwrap();
        assert!(card.is_forward("UIComponent"));
        assert!(!card.is_forward("CardProps"));

        let union_at = plan.position("UIComponent").unwrap();
        assert!(plan.position("CardComponent").unwrap() < union_at);
        assert!(plan.position("ButtonComponent").unwrap() < union_at);

        let forward: Vec<_> = plan.forward_referencing().map(|i| i.name.as_str()).collect();
        assert_eq!(forward, vec!["CardComponent"]);
    }

    #[test]
    fn test_self_reference_is_forward() {
        let table = DefinitionTable::new(SchemaRoot {
            metadata_type: "Tree".into(),
            root_type: "Tree".into(),
            ..SchemaRoot::default()
        })
        .with(object(
            "Tree",
            &[("children", PropertySpec::array(PropertySpec::reference("Tree")))],
        ));
        let plan = plan(&table, &SectionOrder::default()).unwrap();
        assert!(plan.get("Tree").unwrap().is_forward("Tree"));
    }

    #[test]
    fn test_section_order_breaks_ties() {
        let order = SectionOrder::new(vec![
            Section::Props,
            Section::Enums,
            Section::Actions,
            Section::Unions,
            Section::Components,
            Section::Schema,
        ])
        .unwrap();
        let plan = plan(&ui_table(), &order).unwrap();
        assert_eq!(names(&plan)[0], "CardProps");
        // ButtonProps depends on the enum, which must still come first
        assert!(plan.position("ButtonSize").unwrap() < plan.position("ButtonProps").unwrap());
    }

    // ========================================================================
    // Errors
    // ========================================================================

    #[test]
    fn test_unresolved_reference() {
        let table = ui_table().with(object("Broken", &[("x", PropertySpec::reference("Nope"))]));
        let err = plan(&table, &SectionOrder::default()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::UnresolvedReference { ref name, ref referenced_by }
                if name == "Nope" && referenced_by == "Broken"
        ));
    }

    #[test]
    fn test_missing_root_type() {
        let table = DefinitionTable::new(SchemaRoot::default()).with(object("UIMetadata", &[]));
        let err = plan(&table, &SectionOrder::default()).unwrap_err();
        assert!(matches!(
            err,
            GenerateError::UnresolvedReference { ref name, .. } if name == "UIComponent"
        ));
    }

    #[test]
    fn test_alias_cycle_is_circular_dependency() {
        let table = DefinitionTable::new(SchemaRoot {
            metadata_type: "A".into(),
            root_type: "A".into(),
            ..SchemaRoot::default()
        })
        .with(Definition::new(
            "A",
            DefinitionKind::Alias(AliasDef::new(PropertySpec::array(PropertySpec::reference("B")))),
        ))
        .with(Definition::new(
            "B",
            DefinitionKind::Alias(AliasDef::new(PropertySpec::array(PropertySpec::reference("A")))),
        ));
        let err = plan(&table, &SectionOrder::default()).unwrap_err();
        let GenerateError::CircularDependency { cycle } = err else {
            panic!("expected circular dependency, got {err:?}");
        };
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 3);
    }
}
