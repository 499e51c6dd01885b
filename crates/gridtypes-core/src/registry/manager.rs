use std::collections::HashMap;
use std::fs;
use std::path::Path;

use gridtypes_engine::types::{DataType, TagType, TypeArg, TypeId};

use super::order::dependency_order;
use super::{TaggedTypeDefinition, TypeArgExpr, TypeExpr, TypeVarDecl};
use crate::error::{GridtypesError, Result};
use crate::storage::{parse_declarations, write_declaration};

/// Registry of tagged types, keyed by name.
///
/// Names are unique. Declaring a name again with an identical definition
/// returns the existing one; with a different definition the new type is
/// renamed (`X`, `X0`, `X1`, ...) so existing columns keep their meaning.
#[derive(Debug, Clone)]
pub struct TypeManager {
    definitions: Vec<TaggedTypeDefinition>,
    by_name: HashMap<TypeId, usize>,
    builtin_count: usize,
}

impl Default for TypeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeManager {
    /// A registry holding only the builtin `Optional` type.
    pub fn new() -> Self {
        let mut manager = TypeManager {
            definitions: Vec::new(),
            by_name: HashMap::new(),
            builtin_count: 0,
        };
        manager.insert(TaggedTypeDefinition::optional());
        manager.builtin_count = manager.definitions.len();
        manager
    }

    fn insert(&mut self, definition: TaggedTypeDefinition) {
        self.by_name.insert(definition.name().clone(), self.definitions.len());
        self.definitions.push(definition);
    }

    /// Declare a tagged type and return the definition it was registered as.
    /// The returned name differs from `name` when `name` was already taken
    /// by a different definition.
    pub fn register_tagged_type(
        &mut self,
        name: &str,
        type_vars: Vec<TypeVarDecl>,
        tags: Vec<TagType<TypeExpr>>,
    ) -> Result<TaggedTypeDefinition> {
        let definition = TaggedTypeDefinition::new(TypeId::new(name), type_vars, tags)?;
        self.register_definition(definition)
    }

    /// Register an already validated definition, deduplicating or renaming it.
    pub fn register_definition(&mut self, definition: TaggedTypeDefinition) -> Result<TaggedTypeDefinition> {
        for tag in definition.tags() {
            if let Some(inner) = &tag.inner {
                self.check_references(inner)?;
            }
        }

        let mut candidate = definition;
        loop {
            match self.by_name.get(candidate.name()) {
                None => {
                    log::debug!("registered tagged type {}", candidate.name());
                    self.insert(candidate.clone());
                    return Ok(candidate);
                }
                Some(&index) if self.definitions[index] == candidate => {
                    return Ok(candidate);
                }
                Some(_) => {
                    let next = TypeId::from(increase_number(candidate.name().as_str()));
                    log::debug!(
                        "tagged type {} already declared differently, trying {}",
                        candidate.name(),
                        next
                    );
                    candidate = candidate.with_name(next);
                }
            }
        }
    }

    fn check_references(&self, expr: &TypeExpr) -> Result<()> {
        match expr {
            TypeExpr::Tagged { name, args } => {
                let definition = self
                    .lookup_definition(name.as_str())
                    .ok_or_else(|| GridtypesError::UnknownType(name.to_string()))?;
                let vars = definition.type_vars();
                if vars.len() != args.len() {
                    return Err(GridtypesError::TypeArgumentMismatch {
                        name: name.to_string(),
                        expected: format!("{} type arguments", vars.len()),
                        found: args.len().to_string(),
                    });
                }
                for (var, arg) in vars.iter().zip(args) {
                    match (var, arg) {
                        (TypeVarDecl::Type(_), TypeArgExpr::Type(ty)) => self.check_references(ty)?,
                        (TypeVarDecl::Unit(_), TypeArgExpr::Unit(_)) => {}
                        (var, _) => {
                            return Err(GridtypesError::TypeArgumentMismatch {
                                name: name.to_string(),
                                expected: format!("an argument for {}", var),
                                found: "an argument of the other kind".to_string(),
                            });
                        }
                    }
                }
                Ok(())
            }
            TypeExpr::Tuple(members) => members.iter().try_for_each(|m| self.check_references(m)),
            TypeExpr::Array(Some(element)) => self.check_references(element),
            TypeExpr::Function(arg, result) => {
                self.check_references(arg)?;
                self.check_references(result)
            }
            _ => Ok(()),
        }
    }

    pub fn lookup_definition(&self, name: &str) -> Option<&TaggedTypeDefinition> {
        self.by_name
            .get(&TypeId::new(name))
            .map(|&index| &self.definitions[index])
    }

    /// Instantiate the named type with `args`.
    pub fn lookup_type(&self, name: &str, args: &[TypeArg]) -> Result<DataType> {
        let definition = self
            .lookup_definition(name)
            .ok_or_else(|| GridtypesError::UnknownType(name.to_string()))?;
        definition.instantiate(args, self)
    }

    /// Resolve a closed type expression against this registry.
    pub fn resolve(&self, expr: &TypeExpr) -> Result<DataType> {
        expr.resolve(self)
    }

    /// User-declared definitions in registration order; builtins excluded.
    pub fn user_definitions(&self) -> &[TaggedTypeDefinition] {
        &self.definitions[self.builtin_count..]
    }

    pub fn is_builtin(&self, name: &TypeId) -> bool {
        self.by_name
            .get(name)
            .is_some_and(|&index| index < self.builtin_count)
    }

    /// Write every user-declared type, each after the types it references.
    pub fn save(&self) -> Result<String> {
        let roots: Vec<TypeId> = self.user_definitions().iter().map(|d| d.name().clone()).collect();
        let order = dependency_order(&roots, |name| {
            self.lookup_definition(name.as_str())
                .map(|d| {
                    d.referenced_types()
                        .into_iter()
                        .filter(|dep| !self.is_builtin(dep))
                        .collect()
                })
                .unwrap_or_default()
        })
        .map_err(|cycle| GridtypesError::RecursiveTypes(cycle.iter().map(|t| t.to_string()).collect()))?;
        log::debug!(
            "saving {} types in order: {}",
            order.len(),
            order.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
        );

        let mut lines = vec!["# gridtypes declarations".to_string()];
        for name in &order {
            let definition = self
                .lookup_definition(name.as_str())
                .ok_or_else(|| GridtypesError::UnknownType(name.to_string()))?;
            lines.push(write_declaration(definition));
        }
        Ok(lines.join("\n") + "\n")
    }

    /// Parse and register every declaration in `content`. References to a
    /// type that had to be renamed follow the rename.
    pub fn load(&mut self, content: &str) -> Result<Vec<TaggedTypeDefinition>> {
        let mut renames: HashMap<TypeId, TypeId> = HashMap::new();
        let mut registered = Vec::new();
        for mut definition in parse_declarations(content)? {
            definition.rename_references(&renames);
            let declared = definition.name().clone();
            let actual = self.register_definition(definition)?;
            if *actual.name() != declared {
                renames.insert(declared, actual.name().clone());
            } else {
                renames.remove(&declared);
            }
            registered.push(actual);
        }
        Ok(registered)
    }

    pub fn load_file(&mut self, path: &Path) -> Result<Vec<TaggedTypeDefinition>> {
        let content = fs::read_to_string(path)?;
        self.load(&content)
    }

    pub fn save_file(&self, path: &Path) -> Result<()> {
        fs::write(path, self.save()?)?;
        Ok(())
    }
}

/// Next name to try after `name` is taken: bump a trailing number, or
/// append `0` when there is none.
pub fn increase_number(name: &str) -> String {
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &name[stem.len()..];
    match digits.parse::<u64>() {
        Ok(n) if !digits.is_empty() => match n.checked_add(1) {
            Some(next) => format!("{}{}", stem, next),
            None => format!("{}0", name),
        },
        _ => format!("{}0", name),
    }
}
