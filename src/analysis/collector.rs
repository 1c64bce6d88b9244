use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{analysis::resolver::Resolver, domain::ModuleName, parser::types::*};

/// Identifiers never tracked as attribute bases. `self` and `msg` objects are
/// conventionally instances, not modules, and drown the results otherwise.
const IGNORED_ATTR_BASES: [&str; 2] = ["self", "msg"];

/// What one file contributes to the aggregate: which names it imports from
/// which resolved module files, and which attributes it reads off imported
/// module bindings.
#[derive(Debug, Default)]
pub struct FileUsage {
    pub from_imports: FxHashMap<PathBuf, FxHashSet<String>>,
    pub attr_access: Vec<(String, PathBuf)>,
}

/// Walks one file's syntax tree. Only imports and single-identifier attribute
/// accesses contribute; everything else is traversed for the imports and
/// accesses nested inside it.
pub struct Collector<'a, 't> {
    resolver: &'a mut Resolver<'t>,
    rel_dir: PathBuf,
    /// Local name -> (origin dotted name, resolved file). The key for an
    /// unaliased `import x.y` is the full dotted text, so only dotless plain
    /// imports can ever match an attribute base.
    bindings: FxHashMap<String, (String, Option<PathBuf>)>,
    from_imports: FxHashMap<PathBuf, FxHashSet<String>>,
    attr_pairs: FxHashSet<(String, String)>,
}

impl<'a, 't> Collector<'a, 't> {
    pub fn collect(resolver: &'a mut Resolver<'t>, rel_dir: &Path, ast: &Ast) -> FileUsage {
        let mut collector = Collector {
            resolver,
            rel_dir: rel_dir.to_path_buf(),
            bindings: FxHashMap::default(),
            from_imports: FxHashMap::default(),
            attr_pairs: FxHashSet::default(),
        };
        for stmt in ast {
            collector.walk_statement(stmt);
        }
        collector.finish()
    }

    /// Resolves the recorded (identifier, attribute) pairs through the
    /// binding map. Unbound identifiers are dropped without comment: they are
    /// locals, builtins, or something else we do not model.
    fn finish(self) -> FileUsage {
        let mut attr_access = vec![];
        for (id, attr) in self.attr_pairs {
            if IGNORED_ATTR_BASES.contains(&id.as_str()) {
                continue;
            }
            if let Some((_, Some(path))) = self.bindings.get(&id) {
                attr_access.push((attr, path.clone()));
            }
        }
        FileUsage {
            from_imports: self.from_imports,
            attr_access,
        }
    }

    fn walk_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Expression(expr) => self.walk_expr(expr),
            Statement::Assign { targets, value } => {
                self.walk_expr(value);
                for target in targets {
                    self.walk_expr(target);
                }
            }
            Statement::AugAssign { target, value } => {
                self.walk_expr(target);
                self.walk_expr(value);
            }
            Statement::AnnAssign {
                target,
                annotation,
                value,
            } => {
                self.walk_expr(target);
                self.walk_expr(annotation);
                self.walk_opt_expr(value.as_ref());
            }
            Statement::Import(items) => self.handle_import(items),
            Statement::FromImport { path, names } => self.handle_from_import(path, names),
            Statement::FunctionDef {
                defaults,
                body,
                decorators,
                ..
            } => {
                self.walk_exprs(defaults);
                self.walk_block(body);
                self.walk_exprs(decorators);
            }
            // Class bases and decorators are deliberately not traversed; only
            // the body carries the import usage this pass is after.
            Statement::ClassDef { body, .. } => self.walk_block(body),
            Statement::If {
                branches,
                else_block,
            } => {
                for branch in branches {
                    self.walk_expr(&branch.condition);
                    self.walk_block(&branch.body);
                }
                self.walk_opt_block(else_block.as_ref());
            }
            Statement::While {
                condition,
                body,
                else_block,
            } => {
                self.walk_expr(condition);
                self.walk_block(body);
                self.walk_opt_block(else_block.as_ref());
            }
            Statement::For {
                target,
                iterable,
                body,
                else_block,
            } => {
                self.walk_expr(target);
                self.walk_expr(iterable);
                self.walk_block(body);
                self.walk_opt_block(else_block.as_ref());
            }
            Statement::Try {
                body,
                handlers,
                else_block,
                finally_block,
            } => {
                self.walk_block(body);
                for handler in handlers {
                    self.walk_opt_expr(handler.exception.as_ref());
                    self.walk_block(&handler.body);
                }
                self.walk_opt_block(else_block.as_ref());
                self.walk_opt_block(finally_block.as_ref());
            }
            Statement::With { items, body } => {
                for item in items {
                    self.walk_expr(&item.context);
                    self.walk_opt_expr(item.target.as_ref());
                }
                self.walk_block(body);
            }
            Statement::Return(value) => self.walk_opt_expr(value.as_ref()),
            Statement::Raise { exception, cause } => {
                self.walk_opt_expr(exception.as_ref());
                self.walk_opt_expr(cause.as_ref());
            }
            Statement::Assert { test, message } => {
                self.walk_expr(test);
                self.walk_opt_expr(message.as_ref());
            }
            // Deleted names and scope declarations carry no module usage.
            Statement::Delete(_)
            | Statement::Global(_)
            | Statement::Nonlocal(_)
            | Statement::Pass
            | Statement::Break
            | Statement::Continue => {}
        }
    }

    fn walk_block(&mut self, block: &Ast) {
        for stmt in block {
            self.walk_statement(stmt);
        }
    }

    fn walk_opt_block(&mut self, block: Option<&Ast>) {
        if let Some(block) = block {
            self.walk_block(block);
        }
    }

    fn walk_exprs(&mut self, exprs: &[Expr]) {
        for expr in exprs {
            self.walk_expr(expr);
        }
    }

    fn walk_opt_expr(&mut self, expr: Option<&Expr>) {
        if let Some(expr) = expr {
            self.walk_expr(expr);
        }
    }

    fn walk_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Attribute { object, attr } => match object.as_ref() {
                Expr::Name(id) => {
                    self.attr_pairs.insert((id.clone(), attr.clone()));
                }
                other => self.walk_expr(other),
            },
            Expr::Tuple(elements) | Expr::List(elements) | Expr::Set(elements) => {
                self.walk_exprs(elements)
            }
            Expr::Dict(items) => {
                for item in items {
                    match item {
                        DictItem::Pair(key, value) => {
                            self.walk_expr(key);
                            self.walk_expr(value);
                        }
                        DictItem::Unpack(expr) => self.walk_expr(expr),
                    }
                }
            }
            Expr::Subscript { object, index } => {
                self.walk_expr(object);
                self.walk_expr(index);
            }
            Expr::Slice { start, stop, step } => {
                self.walk_opt_expr(start.as_deref());
                self.walk_opt_expr(stop.as_deref());
                self.walk_opt_expr(step.as_deref());
            }
            Expr::Call {
                callee,
                args,
                kwargs,
            } => {
                self.walk_exprs(args);
                for kwarg in kwargs {
                    self.walk_expr(&kwarg.value);
                }
                self.walk_expr(callee);
            }
            Expr::Operation(operands) => self.walk_exprs(operands),
            Expr::Unary(operand)
            | Expr::Starred(operand)
            | Expr::Await(operand)
            | Expr::YieldFrom(operand)
            | Expr::Lambda(operand) => self.walk_expr(operand),
            Expr::Yield(value) => self.walk_opt_expr(value.as_deref()),
            Expr::Ternary {
                condition,
                if_value,
                else_value,
            } => {
                self.walk_expr(condition);
                self.walk_expr(if_value);
                self.walk_expr(else_value);
            }
            Expr::ListComprehension { body, clauses }
            | Expr::SetComprehension { body, clauses }
            | Expr::GeneratorComprehension { body, clauses } => {
                self.walk_expr(body);
                self.walk_clauses(clauses);
            }
            Expr::DictComprehension {
                key_body,
                value_body,
                clauses,
            } => {
                self.walk_expr(key_body);
                self.walk_expr(value_body);
                self.walk_clauses(clauses);
            }
            Expr::Walrus { value, .. } => self.walk_expr(value),
            // Names alone are not usage, and f-string bodies stay opaque.
            Expr::Name(_)
            | Expr::None
            | Expr::Ellipsis
            | Expr::Boolean(_)
            | Expr::Number(_)
            | Expr::StringLiteral(_)
            | Expr::BytesLiteral(_)
            | Expr::FString(_) => {}
        }
    }

    fn walk_clauses(&mut self, clauses: &[ForClause]) {
        for clause in clauses {
            self.walk_expr(&clause.target);
            self.walk_expr(&clause.iterable);
            self.walk_exprs(&clause.conditions);
        }
    }

    fn handle_import(&mut self, items: &[ImportItem]) {
        for item in items {
            let Some(path) = self.resolver.resolve(&item.module, &self.rel_dir, false) else {
                continue;
            };
            let local = match &item.alias {
                Some(alias) => alias.clone(),
                None => item.module.as_str(),
            };
            self.bindings.insert(local, (item.module.as_str(), Some(path)));
        }
    }

    fn handle_from_import(&mut self, path: &ImportPath, names: &FromImportNames) {
        // An implicit target (`from . import x`) means the referencing
        // directory's own package. Deeper relative levels keep only their
        // textual tail; the sibling check in the resolver covers the
        // single-level case.
        let target = match path {
            ImportPath::Absolute(name) => name.clone(),
            ImportPath::Relative(_, tail) if tail.is_empty() => {
                ModuleName::from_dir(&self.rel_dir)
            }
            ImportPath::Relative(_, tail) => tail.clone(),
        };

        let Some(module_path) = self.resolver.resolve(&target, &self.rel_dir, false) else {
            return;
        };

        match names {
            FromImportNames::Star => {
                self.from_imports
                    .entry(module_path)
                    .or_default()
                    .insert("*".to_string());
            }
            FromImportNames::List(items) => {
                for item in items {
                    // The imported name may itself be a submodule; probe
                    // silently so attribute uses accrue to its file.
                    let full = target.child(&item.name);
                    let sub_path = self.resolver.resolve(&full, &self.rel_dir, true);
                    let local = item.alias.as_ref().unwrap_or(&item.name).clone();
                    self.bindings.insert(local, (full.as_str(), sub_path));
                    self.from_imports
                        .entry(module_path.clone())
                        .or_default()
                        .insert(item.name.clone());
                }
            }
        }
    }
}
