//! Namespace registry shared across blocks
//!
//! Modules, classes and committed functions live in arenas indexed by
//! typed ids. A registry is owned by the caller and handed to every parse
//! call; blocks are parsed one at a time against it.

use indexmap::IndexMap;
use serde::Serialize;

use crate::destination::{self, Destination, Routing};
use crate::errors::{DslError, DslResult};
use crate::model::Function;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClassId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionId(usize);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Module {
    pub name: String,
    pub parent: Option<ModuleId>,
    pub modules: IndexMap<String, ModuleId>,
    pub classes: IndexMap<String, ClassId>,
    pub functions: Vec<FunctionId>,
}

impl Module {
    fn new(name: &str, parent: Option<ModuleId>) -> Self {
        Self {
            name: name.to_string(),
            parent,
            modules: IndexMap::new(),
            classes: IndexMap::new(),
            functions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Class {
    pub name: String,
    pub module: ModuleId,
    pub parent: Option<ClassId>,
    pub typedef: String,
    pub type_object: String,
    pub classes: IndexMap<String, ClassId>,
    pub functions: Vec<FunctionId>,
}

/// Something a block declared, in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum Signature {
    Module(ModuleId),
    Class(ClassId),
    Function(FunctionId),
}

/// Settings that directives may change and that the composer reads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClinicConfig {
    pub line_prefix: String,
    pub line_suffix: String,
    /// Soft-wrap column for calling-convention lines and the line-length limit
    pub docstring_width: usize,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            line_prefix: String::new(),
            line_suffix: String::new(),
            docstring_width: 72,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registry {
    pub config: ClinicConfig,
    modules: Vec<Module>,
    classes: Vec<Class>,
    functions: Vec<Function>,
    destinations: IndexMap<String, Destination>,
    routing: Routing,
    routing_stack: Vec<Routing>,
}

/// Registry state a rejected block is rolled back to.
///
/// Arenas only grow while a block is parsed, so their lengths are enough
/// to find what the block added. The directive state is small and copied.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    modules: usize,
    classes: usize,
    functions: usize,
    config: ClinicConfig,
    destinations: IndexMap<String, Destination>,
    routing: Routing,
    routing_stack: Vec<Routing>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::with_config(ClinicConfig::default())
    }

    pub fn with_config(config: ClinicConfig) -> Self {
        Self {
            config,
            modules: vec![Module::new("", None)],
            classes: Vec::new(),
            functions: Vec::new(),
            destinations: destination::default_destinations(),
            routing: destination::default_routing(),
            routing_stack: Vec::new(),
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            modules: self.modules.len(),
            classes: self.classes.len(),
            functions: self.functions.len(),
            config: self.config.clone(),
            destinations: self.destinations.clone(),
            routing: self.routing.clone(),
            routing_stack: self.routing_stack.clone(),
        }
    }

    /// Undo everything declared since `checkpoint` was taken
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        // Newest first, so each owner's list ends with the entry being removed
        for function in self.functions.split_off(checkpoint.functions).iter().rev() {
            match function.class {
                Some(cls) => self.classes[cls.0].functions.pop(),
                None => self.modules[function.module.0].functions.pop(),
            };
        }
        for class in self.classes.split_off(checkpoint.classes).iter().rev() {
            match class.parent {
                Some(parent) => self.classes[parent.0].classes.pop(),
                None => self.modules[class.module.0].classes.pop(),
            };
        }
        for module in self.modules.split_off(checkpoint.modules).iter().rev() {
            if let Some(parent) = module.parent {
                self.modules[parent.0].modules.pop();
            }
        }
        self.config = checkpoint.config;
        self.destinations = checkpoint.destinations;
        self.routing = checkpoint.routing;
        self.routing_stack = checkpoint.routing_stack;
    }

    pub fn root(&self) -> ModuleId {
        ModuleId(0)
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0]
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0]
    }

    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &Function)> {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FunctionId(i), f))
    }

    /// Resolve dotted scope fields to the innermost module and class
    pub fn module_and_class(&self, fields: &[&str]) -> DslResult<(ModuleId, Option<ClassId>)> {
        let mut module = self.root();
        let mut class: Option<ClassId> = None;
        for field in fields {
            if class.is_none() {
                if let Some(&child) = self.module(module).modules.get(*field) {
                    module = child;
                    continue;
                }
            }
            let classes = match class {
                Some(id) => &self.class(id).classes,
                None => &self.module(module).classes,
            };
            match classes.get(*field) {
                Some(&child) => class = Some(child),
                None => {
                    return Err(DslError::semantic(format!(
                        "Parent class or module {:?} does not exist.",
                        field
                    )))
                }
            }
        }
        Ok((module, class))
    }

    pub fn declare_module(&mut self, full_name: &str) -> DslResult<ModuleId> {
        let fields: Vec<&str> = full_name.split('.').collect();
        let (name, parents) = fields
            .split_last()
            .ok_or_else(|| DslError::directive("Empty module name"))?;
        let (parent, class) = self.module_and_class(parents)?;
        if class.is_some() {
            return Err(DslError::directive("Can't nest a module inside a class!"));
        }
        if self.module(parent).modules.contains_key(*name) {
            return Err(DslError::directive(format!(
                "Already defined module {:?}!",
                full_name
            )));
        }
        let id = ModuleId(self.modules.len());
        self.modules.push(Module::new(name, Some(parent)));
        self.modules[parent.0].modules.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn declare_class(&mut self, full_name: &str, typedef: &str, type_object: &str) -> DslResult<ClassId> {
        let fields: Vec<&str> = full_name.split('.').collect();
        let (name, parents) = fields
            .split_last()
            .ok_or_else(|| DslError::directive("Empty class name"))?;
        let (module, parent) = self.module_and_class(parents)?;
        let exists = match parent {
            Some(cls) => self.class(cls).classes.contains_key(*name),
            None => self.module(module).classes.contains_key(*name),
        };
        if exists {
            return Err(DslError::directive(format!(
                "Already defined class {:?}!",
                name
            )));
        }
        let id = ClassId(self.classes.len());
        self.classes.push(Class {
            name: name.to_string(),
            module,
            parent,
            typedef: typedef.to_string(),
            type_object: type_object.to_string(),
            classes: IndexMap::new(),
            functions: Vec::new(),
        });
        match parent {
            Some(cls) => self.classes[cls.0].classes.insert(name.to_string(), id),
            None => self.modules[module.0].classes.insert(name.to_string(), id),
        };
        Ok(id)
    }

    /// Append a sealed function to its owner's function list
    pub fn commit_function(&mut self, function: Function) -> FunctionId {
        let id = FunctionId(self.functions.len());
        match function.class {
            Some(cls) => self.classes[cls.0].functions.push(id),
            None => self.modules[function.module.0].functions.push(id),
        }
        self.functions.push(function);
        id
    }

    /// Look up a committed function by its dotted name
    pub fn find_function(&self, full_name: &str) -> DslResult<&Function> {
        let fields: Vec<&str> = full_name.split('.').map(str::trim).collect();
        let (name, parents) = fields
            .split_last()
            .ok_or_else(|| DslError::semantic("Empty function name"))?;
        let (module, class) = self.module_and_class(parents)?;
        let owned = match class {
            Some(cls) => &self.class(cls).functions,
            None => &self.module(module).functions,
        };
        owned
            .iter()
            .map(|&id| self.function(id))
            .find(|f| f.name == *name)
            .ok_or_else(|| {
                DslError::semantic(format!("Couldn't find existing function {:?}!", full_name))
            })
    }

    pub fn add_destination(&mut self, name: &str, kind: &str, args: &[String]) -> DslResult<()> {
        if self.destinations.contains_key(name) {
            return Err(DslError::directive(format!(
                "Destination already exists: {:?}",
                name
            )));
        }
        let destination = Destination::new(name, kind, args)?;
        self.destinations.insert(name.to_string(), destination);
        Ok(())
    }

    pub fn destination(&self, name: &str) -> DslResult<&Destination> {
        self.destinations
            .get(name)
            .ok_or_else(|| DslError::directive(format!("Destination does not exist: {:?}", name)))
    }

    pub fn destination_mut(&mut self, name: &str) -> DslResult<&mut Destination> {
        self.destinations
            .get_mut(name)
            .ok_or_else(|| DslError::directive(format!("Destination does not exist: {:?}", name)))
    }

    pub fn routing(&self) -> &Routing {
        &self.routing
    }

    /// Route one output field, or every field, to a destination
    pub fn route(&mut self, field: &str, destination: &str) -> DslResult<()> {
        self.destination(destination)?;
        let target = destination::BufferRef {
            destination: destination.to_string(),
            index: 0,
        };
        if field == "everything" {
            for slot in self.routing.values_mut() {
                *slot = target.clone();
            }
            return Ok(());
        }
        match self.routing.get_mut(field) {
            Some(slot) => {
                *slot = target;
                Ok(())
            }
            None => {
                let mut allowed = vec!["preset", "push", "pop", "everything"];
                allowed.extend(destination::OUTPUT_FIELDS);
                Err(DslError::directive(format!(
                    "Invalid command or destination name {:?}. Must be one of:\n  {}",
                    field,
                    allowed.join("\n  ")
                )))
            }
        }
    }

    pub fn apply_preset(&mut self, name: &str) -> DslResult<()> {
        let preset = destination::preset(name)
            .ok_or_else(|| DslError::directive(format!("Unknown preset {:?}!", name)))?;
        self.routing.extend(preset);
        Ok(())
    }

    pub fn push_routing(&mut self) {
        self.routing_stack.push(self.routing.clone());
    }

    pub fn pop_routing(&mut self) -> DslResult<()> {
        let previous = self
            .routing_stack
            .pop()
            .ok_or_else(|| DslError::directive("Can't 'output pop', stack is empty!"))?;
        self.routing = previous;
        Ok(())
    }
}
