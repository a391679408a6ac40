//! # Task Scheduler
//!
//! The search runs as a stack of small tasks instead of recursion. Every task is
//! pushed, popped once, executed and discarded; executing a task may push more.
//! Because the stack is LIFO, work pushed by a task runs to completion before
//! anything that was below it, which is how "optimize the children, then cost the
//! parent" falls out without recursion.
//!
//! ## Tasks
//!
//! - **OptimizeGroup**: find the cheapest physical plan for a group. Runs once per
//!   group; schedules `OptimizeExpr` for every logical expression.
//! - **ExploreGroup**: generate logical alternatives for a group. Runs once per
//!   group; schedules `OptimizeExpr` in exploring mode.
//! - **OptimizeExpr**: schedule every matching rule for an expression and make sure
//!   its child groups are explored first.
//! - **ApplyRule**: fire one rule and attach the results to the expression's group.
//!   New logical expressions are optimized in turn; physical ones are costed unless
//!   we are only exploring.
//! - **OptimizeInputs**: optimize a physical expression's child groups one at a
//!   time, re-pushing itself with the next child index. Once every child has been
//!   optimized the expression is costed and may become the group's winner.
//!
//! ## Ordering
//!
//! Lists are pushed in reverse so that the first logical expression and the first
//! registered rule are handled first. With a fixed rule set, memo and input tree,
//! the sequence of executed tasks is fully deterministic.
//!
//! ## Search Context
//!
//! A group is implemented at most once, under the context of the first
//! `OptimizeGroup` that reaches it. The `implemented` flag does not record that
//! context, so a group optimized under a tight `upper_bound` that found no
//! winner is not retried when a looser bound asks for it later. The optimizer
//! facade always searches with the default, unbounded context.

use crate::cost::{Cost, CostModel};
use crate::expr::Operator;
use crate::memo::{ExprId, GroupId, Memo, Winner};
use crate::properties::LogicalProperties;
use crate::rule::{RuleResult, RuleSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// Requirements threaded through the search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchContext {
    /// Plans costing more than this are never recorded as winners.
    pub upper_bound: Cost,
}

impl Default for SearchContext {
    fn default() -> Self {
        Self {
            upper_bound: Cost::infinite(),
        }
    }
}

/// A unit of search work.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    OptimizeGroup {
        group: GroupId,
        ctx: SearchContext,
    },
    ExploreGroup {
        group: GroupId,
        ctx: SearchContext,
    },
    OptimizeExpr {
        expr: ExprId,
        ctx: SearchContext,
        exploring: bool,
    },
    /// `rule` indexes into the scheduler's rule set.
    ApplyRule {
        rule: usize,
        expr: ExprId,
        ctx: SearchContext,
        exploring: bool,
    },
    /// `child_index` is the next child group to optimize.
    OptimizeInputs {
        expr: ExprId,
        ctx: SearchContext,
        child_index: usize,
    },
}

/// Counters collected over one `run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub tasks_executed: usize,
    pub rule_applications: usize,
    /// Expressions added to the memo by rule applications.
    pub exprs_added: usize,
    pub max_stack_depth: usize,
}

/// Runs tasks against a memo until the stack is empty.
pub struct TaskScheduler<'m> {
    memo: &'m mut Memo,
    rules: Arc<RuleSet>,
    cost_model: Arc<dyn CostModel>,
    stack: Vec<Task>,
    stats: SchedulerStats,
}

impl<'m> TaskScheduler<'m> {
    pub fn new(memo: &'m mut Memo, rules: Arc<RuleSet>, cost_model: Arc<dyn CostModel>) -> Self {
        Self {
            memo,
            rules,
            cost_model,
            stack: Vec::new(),
            stats: SchedulerStats::default(),
        }
    }

    pub fn schedule(&mut self, task: Task) {
        self.stack.push(task);
        self.stats.max_stack_depth = self.stats.max_stack_depth.max(self.stack.len());
    }

    /// Number of tasks waiting on the stack.
    pub fn pending(&self) -> usize {
        self.stack.len()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Execute tasks until the stack is empty.
    pub fn run(&mut self) -> &SchedulerStats {
        while let Some(task) = self.stack.pop() {
            self.stats.tasks_executed += 1;
            trace!("Task {:?}", task);
            self.execute(task);
        }
        debug!(
            "Scheduler drained: tasks={}, rule_applications={}, groups={}, exprs={}",
            self.stats.tasks_executed,
            self.stats.rule_applications,
            self.memo.num_groups(),
            self.memo.num_exprs()
        );
        &self.stats
    }

    fn execute(&mut self, task: Task) {
        match task {
            Task::OptimizeGroup { group, ctx } => self.optimize_group(group, ctx),
            Task::ExploreGroup { group, ctx } => self.explore_group(group, ctx),
            Task::OptimizeExpr {
                expr,
                ctx,
                exploring,
            } => self.optimize_expr(expr, ctx, exploring),
            Task::ApplyRule {
                rule,
                expr,
                ctx,
                exploring,
            } => self.apply_rule(rule, expr, ctx, exploring),
            Task::OptimizeInputs {
                expr,
                ctx,
                child_index,
            } => self.optimize_inputs(expr, ctx, child_index),
        }
    }

    fn optimize_group(&mut self, group_id: GroupId, ctx: SearchContext) {
        let Some(group) = self.memo.get_group(group_id) else {
            debug!("OptimizeGroup on unknown group {}", group_id);
            return;
        };
        if group.implemented {
            return;
        }
        let logical_exprs = group.logical_exprs.clone();
        self.memo.group_mut(group_id).implemented = true;

        for &expr in logical_exprs.iter().rev() {
            self.schedule(Task::OptimizeExpr {
                expr,
                ctx,
                exploring: false,
            });
        }
    }

    fn explore_group(&mut self, group_id: GroupId, ctx: SearchContext) {
        let Some(group) = self.memo.get_group(group_id) else {
            debug!("ExploreGroup on unknown group {}", group_id);
            return;
        };
        if group.explored {
            return;
        }
        let logical_exprs = group.logical_exprs.clone();
        self.memo.group_mut(group_id).explored = true;

        for &expr in logical_exprs.iter().rev() {
            self.schedule(Task::OptimizeExpr {
                expr,
                ctx,
                exploring: true,
            });
        }
    }

    fn optimize_expr(&mut self, expr_id: ExprId, ctx: SearchContext, exploring: bool) {
        let Some(expr) = self.memo.get_expr(expr_id) else {
            return;
        };
        let children = expr.children.clone();
        let is_physical = expr.op.is_physical();

        let matching = self.rules.matching(self.memo, expr_id);
        for &rule in matching.iter().rev() {
            self.schedule(Task::ApplyRule {
                rule,
                expr: expr_id,
                ctx,
                exploring,
            });
        }

        if !exploring && is_physical {
            self.schedule(Task::OptimizeInputs {
                expr: expr_id,
                ctx,
                child_index: 0,
            });
        }

        for &group in children.iter().rev() {
            self.schedule(Task::ExploreGroup { group, ctx });
        }
    }

    fn apply_rule(&mut self, rule_index: usize, expr_id: ExprId, ctx: SearchContext, exploring: bool) {
        let Some(rule) = self.rules.get(rule_index) else {
            return;
        };
        let Some(expr) = self.memo.get_expr(expr_id) else {
            return;
        };
        let group = expr.group;
        let results = rule.apply(expr, self.memo);
        trace!(
            "Rule '{}' on expr {} produced {} result(s)",
            rule.name(),
            expr_id,
            results.len()
        );
        self.stats.rule_applications += 1;

        for RuleResult { op, children } in results {
            let is_logical = op.is_logical();
            let (new_expr, added) = self.memo.add_expr_to_group(group, op, children);
            if added {
                self.stats.exprs_added += 1;
                trace!("  Created expr {} in group {}", new_expr, group);
            }

            if is_logical {
                // An expression already in the memo has been or will be handled
                // by whoever inserted it.
                if added {
                    self.schedule(Task::OptimizeExpr {
                        expr: new_expr,
                        ctx,
                        exploring,
                    });
                }
            } else if !exploring {
                // Costing is idempotent, so a physical expression first produced
                // while exploring is costed here.
                self.schedule(Task::OptimizeInputs {
                    expr: new_expr,
                    ctx,
                    child_index: 0,
                });
            }
        }
    }

    fn optimize_inputs(&mut self, expr_id: ExprId, ctx: SearchContext, child_index: usize) {
        let Some(expr) = self.memo.get_expr(expr_id) else {
            return;
        };
        let group_id = expr.group;
        let children = expr.children.clone();

        if let Some(&child) = children.get(child_index) {
            self.schedule(Task::OptimizeInputs {
                expr: expr_id,
                ctx,
                child_index: child_index + 1,
            });
            self.schedule(Task::OptimizeGroup { group: child, ctx });
            return;
        }

        let cost = {
            let Operator::Physical(op) = &expr.op else {
                return;
            };

            let mut child_costs = Vec::with_capacity(children.len());
            for &child in &children {
                match self.memo.get_group(child).and_then(|g| g.winner) {
                    Some(w) => child_costs.push(w.cost),
                    None => {
                        trace!("Expr {} infeasible: group {} has no winner", expr_id, child);
                        return;
                    }
                }
            }

            let empty = LogicalProperties::empty();
            let props_of = |g: GroupId| {
                self.memo
                    .get_group(g)
                    .and_then(|g| g.props.as_ref())
                    .unwrap_or(&empty)
            };
            let inputs: Vec<&LogicalProperties> = children.iter().map(|&c| props_of(c)).collect();
            let cost = self
                .cost_model
                .compute_cost(op, props_of(group_id), &inputs, &child_costs);
            // Overflowed totals saturate so they stay comparable with the bound.
            Cost::new(cost.total)
        };

        if cost > ctx.upper_bound {
            trace!(
                "Expr {} cost {:.1} exceeds bound {:.1}",
                expr_id,
                cost.total,
                ctx.upper_bound.total
            );
            return;
        }

        let group = self.memo.group_mut(group_id);
        let improves = group.winner.map_or(true, |w| cost < w.cost);
        if improves {
            group.winner = Some(Winner {
                expr_id,
                cost,
            });
            trace!("  New best for group {}: expr {} cost={:.1}", group_id, expr_id, cost.total);
        }
    }
}
