//! # The Memo
//!
//! The memo compactly represents every plan the search has discovered. It is an
//! arena of **groups** (equivalence classes of expressions producing the same
//! logical result) and **expressions** (an operator whose inputs are child
//! *groups*, not child expressions). Both are addressed by dense integer ids that
//! stay valid for the memo's lifetime; nothing is ever removed.
//!
//! ## Seeding
//!
//! `init_memo` walks the input operator tree in post-order with an explicit
//! worklist and inserts each node as its own group, so every child group exists
//! (with its logical properties) before its parent is derived.
//!
//! ## Deduplication
//!
//! Expressions are indexed by `(operator, child group ids)`. Inserting an
//! expression that is already present returns the existing one instead of
//! growing the memo. This is what bounds the search for rule sets that can undo
//! each other, such as join commutativity applied twice.
//!
//! ## Winners
//!
//! Each group has a single winner slot holding its cheapest costed physical
//! expression. `extract_best_plan` follows winners from the root to build the
//! output `PlanNode` tree.

use crate::catalog::{Catalog, InMemoryCatalog};
use crate::column::{Column, ColumnId, ColumnRegistry};
use crate::cost::Cost;
use crate::error::OptimizeError;
use crate::expr::{Operator, OperatorNode, PhysicalOp};
use crate::properties::{derive_logical_props, DeriveContext, LogicalProperties};
use crate::stats::{CardinalityModel, DefaultCardinalityModel};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

pub type GroupId = u32;
pub type ExprId = u32;

/// A group expression: an operator over child groups.
#[derive(Debug, Clone)]
pub struct MemoExpr {
    pub op: Operator,
    pub children: Vec<GroupId>,
    /// The group this expression belongs to.
    pub group: GroupId,
}

/// The cheapest costed physical expression of a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Winner {
    pub expr_id: ExprId,
    pub cost: Cost,
}

/// An equivalence class of expressions.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub logical_exprs: Vec<ExprId>,
    pub physical_exprs: Vec<ExprId>,
    /// Set once at creation for groups seeded from a logical expression.
    pub props: Option<LogicalProperties>,
    pub explored: bool,
    pub implemented: bool,
    pub winner: Option<Winner>,
}

impl Group {
    fn new(id: GroupId, props: Option<LogicalProperties>) -> Self {
        Self {
            id,
            logical_exprs: Vec::new(),
            physical_exprs: Vec::new(),
            props,
            explored: false,
            implemented: false,
            winner: None,
        }
    }
}

/// A node of the extracted physical plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanNode {
    pub op: PhysicalOp,
    pub group: GroupId,
    pub props: LogicalProperties,
    /// Cost of the whole subtree rooted here.
    pub cost: Cost,
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    /// Render the plan as an indented tree.
    pub fn display(&self, indent: usize) -> String {
        let mut out = String::new();
        let mut stack = vec![(self, indent)];
        while let Some((node, depth)) = stack.pop() {
            out.push_str(&format!(
                "{}{} (group={}, rows={:.1}, cost={:.1})\n",
                "  ".repeat(depth),
                Operator::Physical(node.op.clone()),
                node.group,
                node.props.cardinality(),
                node.cost.total
            ));
            for child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    /// Number of nodes in the plan.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.children);
        }
        count
    }
}

/// The memo table.
pub struct Memo {
    groups: Vec<Group>,
    exprs: Vec<MemoExpr>,
    expr_index: HashMap<(Operator, Vec<GroupId>), ExprId>,
    columns: ColumnRegistry,
    catalog: Arc<dyn Catalog>,
    cardinality: Arc<dyn CardinalityModel>,
}

impl Default for Memo {
    fn default() -> Self {
        Self::new(
            Arc::new(InMemoryCatalog::new()),
            Arc::new(DefaultCardinalityModel::default()),
        )
    }
}

impl Memo {
    pub fn new(catalog: Arc<dyn Catalog>, cardinality: Arc<dyn CardinalityModel>) -> Self {
        Self {
            groups: Vec::new(),
            exprs: Vec::new(),
            expr_index: HashMap::new(),
            columns: ColumnRegistry::new(),
            catalog,
            cardinality,
        }
    }

    /// Seed the memo from an operator tree, one group per node, children first.
    ///
    /// Returns the root group, or `None` for an empty tree.
    pub fn init_memo(&mut self, root: Option<&OperatorNode>) -> Option<GroupId> {
        let root = root?;
        let mut worklist: Vec<(&OperatorNode, bool)> = vec![(root, false)];
        let mut done: Vec<GroupId> = Vec::new();

        while let Some((node, inputs_ready)) = worklist.pop() {
            if inputs_ready {
                let children = done.split_off(done.len() - node.inputs.len());
                let group = self.insert_expression(node.op.clone(), children);
                done.push(group);
            } else {
                worklist.push((node, true));
                for input in node.inputs.iter().rev() {
                    worklist.push((input, false));
                }
            }
        }
        done.pop()
    }

    /// Insert an expression into a new group and return that group.
    ///
    /// A logical expression's group gets properties derived from the children's.
    /// An expression already in the memo is not duplicated: its group is returned.
    pub fn insert_expression(&mut self, op: Operator, children: Vec<GroupId>) -> GroupId {
        if let Some(&existing) = self.expr_index.get(&(op.clone(), children.clone())) {
            return self.exprs[existing as usize].group;
        }

        let props = match &op {
            Operator::Logical(logical) => {
                let inputs: Vec<Option<&LogicalProperties>> = children
                    .iter()
                    .map(|&c| self.groups.get(c as usize).and_then(|g| g.props.as_ref()))
                    .collect();
                let ctx = DeriveContext {
                    catalog: self.catalog.as_ref(),
                    cardinality: self.cardinality.as_ref(),
                };
                Some(derive_logical_props(logical, &mut self.columns, &inputs, ctx))
            }
            Operator::Physical(_) => None,
        };

        let group = self.new_group(props);
        self.add_expr_to_group(group, op, children);
        group
    }

    /// Attach an expression to an existing group.
    ///
    /// Returns the expression id and whether it was newly added. When the
    /// expression already exists (possibly in another group) the existing id is
    /// returned and nothing changes.
    ///
    /// # Panics
    ///
    /// Panics if `group` was not issued by this memo.
    pub fn add_expr_to_group(
        &mut self,
        group: GroupId,
        op: Operator,
        children: Vec<GroupId>,
    ) -> (ExprId, bool) {
        let key = (op, children);
        if let Some(&existing) = self.expr_index.get(&key) {
            let owner = self.exprs[existing as usize].group;
            if owner != group {
                trace!(
                    "Expr {} already lives in group {}, not group {}",
                    existing,
                    owner,
                    group
                );
            }
            return (existing, false);
        }

        let expr_id = self.exprs.len() as ExprId;
        let is_logical = key.0.is_logical();
        self.exprs.push(MemoExpr {
            op: key.0.clone(),
            children: key.1.clone(),
            group,
        });
        let g = &mut self.groups[group as usize];
        if is_logical {
            g.logical_exprs.push(expr_id);
        } else {
            g.physical_exprs.push(expr_id);
        }
        self.expr_index.insert(key, expr_id);
        (expr_id, true)
    }

    pub fn new_group(&mut self, props: Option<LogicalProperties>) -> GroupId {
        let id = self.groups.len() as GroupId;
        self.groups.push(Group::new(id, props));
        id
    }

    pub fn add_column(&mut self, column: Column) -> ColumnId {
        self.columns.register(column)
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.lookup(id)
    }

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    /// Resolve a group's output columns, in id order.
    pub fn target_list(&self, group: GroupId) -> Option<Vec<(ColumnId, &Column)>> {
        let props = self.get_group(group)?.props.as_ref()?;
        props
            .output_columns()
            .iter()
            .map(|id| self.columns.lookup(id).map(|c| (id, c)))
            .collect()
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this memo. See [`Memo::get_group`].
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id as usize]
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this memo.
    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id as usize]
    }

    pub fn get_group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id as usize)
    }

    /// # Panics
    ///
    /// Panics if `id` was not issued by this memo. See [`Memo::get_expr`].
    pub fn expr(&self, id: ExprId) -> &MemoExpr {
        &self.exprs[id as usize]
    }

    pub fn get_expr(&self, id: ExprId) -> Option<&MemoExpr> {
        self.exprs.get(id as usize)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn num_exprs(&self) -> usize {
        self.exprs.len()
    }

    /// Build the physical plan by following winners down from `root`.
    pub fn extract_best_plan(&self, root: GroupId) -> Option<PlanNode> {
        self.try_extract_best_plan(root).ok()
    }

    /// Like [`Memo::extract_best_plan`], naming the first group without a winner.
    ///
    /// Walks the winners in post-order with an explicit worklist, so plan depth
    /// is bounded by memory rather than by the call stack.
    pub fn try_extract_best_plan(&self, root: GroupId) -> Result<PlanNode, OptimizeError> {
        let mut worklist: Vec<(GroupId, bool)> = vec![(root, false)];
        let mut done: Vec<PlanNode> = Vec::new();

        while let Some((group_id, inputs_ready)) = worklist.pop() {
            let (group, winner, expr, op) = self.winning_expr(group_id)?;
            if inputs_ready {
                let children = done.split_off(done.len() - expr.children.len());
                done.push(PlanNode {
                    op: op.clone(),
                    group: group_id,
                    props: group.props.clone().unwrap_or_default(),
                    cost: winner.cost,
                    children,
                });
            } else {
                worklist.push((group_id, true));
                for &child in expr.children.iter().rev() {
                    worklist.push((child, false));
                }
            }
        }
        done.pop().ok_or(OptimizeError::NoPhysicalAlternative { group: root })
    }

    /// The winner of `group_id` and its physical expression.
    fn winning_expr(
        &self,
        group_id: GroupId,
    ) -> Result<(&Group, Winner, &MemoExpr, &PhysicalOp), OptimizeError> {
        let no_plan = || OptimizeError::NoPhysicalAlternative { group: group_id };
        let group = self.get_group(group_id).ok_or_else(no_plan)?;
        let winner = group.winner.ok_or_else(no_plan)?;
        let expr = self.get_expr(winner.expr_id).ok_or_else(no_plan)?;
        match &expr.op {
            Operator::Physical(op) => Ok((group, winner, expr, op)),
            Operator::Logical(_) => Err(no_plan()),
        }
    }
}

impl fmt::Display for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            write!(f, "Group {}", group.id)?;
            if let Some(props) = &group.props {
                write!(
                    f,
                    " rows={:.1} cols={}",
                    props.cardinality(),
                    props.output_columns()
                )?;
            }
            if let Some(w) = group.winner {
                write!(f, " winner=#{} cost={:.1}", w.expr_id, w.cost.total)?;
            }
            writeln!(f)?;
            for &id in group.logical_exprs.iter().chain(&group.physical_exprs) {
                let expr = &self.exprs[id as usize];
                write!(f, "  #{} {}", id, expr.op)?;
                if !expr.children.is_empty() {
                    write!(f, " {:?}", expr.children)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
