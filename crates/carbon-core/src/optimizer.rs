//! # Optimizer Facade
//!
//! Ties the pieces together for one query: seed a memo from the operator tree,
//! push `OptimizeGroup(root)`, drain the scheduler and extract the winners.
//!
//! The rule set, catalog and models are shared (`Arc`) and may be reused across
//! optimizers; the memo is not. Each call to `optimize` starts from a fresh memo,
//! which stays readable through [`Optimizer::memo`] afterwards so the caller can
//! resolve target lists for the returned plan.

use crate::catalog::Catalog;
use crate::config::OptimizerConfig;
use crate::cost::{CostModel, DefaultCostModel};
use crate::error::OptimizeError;
use crate::expr::OperatorNode;
use crate::memo::{Memo, PlanNode};
use crate::rule::RuleSet;
use crate::scheduler::{SchedulerStats, SearchContext, Task, TaskScheduler};
use crate::stats::{CardinalityModel, DefaultCardinalityModel};
use std::sync::Arc;
use tracing::debug;

pub struct Optimizer {
    rules: Arc<RuleSet>,
    catalog: Arc<dyn Catalog>,
    cardinality: Arc<dyn CardinalityModel>,
    cost_model: Arc<dyn CostModel>,
    memo: Memo,
    stats: SchedulerStats,
}

impl Optimizer {
    /// Build an optimizer with the default cardinality and cost models, tuned by `config`.
    pub fn new(rules: Arc<RuleSet>, catalog: Arc<dyn Catalog>, config: OptimizerConfig) -> Self {
        Self::with_models(
            rules,
            catalog,
            Arc::new(DefaultCardinalityModel::from_config(&config)),
            Arc::new(DefaultCostModel::from_config(&config)),
        )
    }

    pub fn with_models(
        rules: Arc<RuleSet>,
        catalog: Arc<dyn Catalog>,
        cardinality: Arc<dyn CardinalityModel>,
        cost_model: Arc<dyn CostModel>,
    ) -> Self {
        let memo = Memo::new(catalog.clone(), cardinality.clone());
        Self {
            rules,
            catalog,
            cardinality,
            cost_model,
            memo,
            stats: SchedulerStats::default(),
        }
    }

    /// Optimize an operator tree, returning the cheapest physical plan.
    ///
    /// `None` means the tree was empty or some group could not be implemented;
    /// [`Optimizer::try_optimize`] says which.
    pub fn optimize(&mut self, root: Option<&OperatorNode>) -> Option<PlanNode> {
        match self.try_optimize(root) {
            Ok(plan) => Some(plan),
            Err(e) => {
                debug!("Optimization failed: {}", e);
                None
            }
        }
    }

    pub fn try_optimize(&mut self, root: Option<&OperatorNode>) -> Result<PlanNode, OptimizeError> {
        self.memo = Memo::new(self.catalog.clone(), self.cardinality.clone());
        self.stats = SchedulerStats::default();

        let root_group = self
            .memo
            .init_memo(root)
            .ok_or(OptimizeError::EmptyOperatorTree)?;

        debug!(
            "Starting optimization: root_group={}, groups={}, exprs={}",
            root_group,
            self.memo.num_groups(),
            self.memo.num_exprs()
        );

        let mut scheduler =
            TaskScheduler::new(&mut self.memo, self.rules.clone(), self.cost_model.clone());
        scheduler.schedule(Task::OptimizeGroup {
            group: root_group,
            ctx: SearchContext::default(),
        });
        self.stats = scheduler.run().clone();

        let plan = self.memo.try_extract_best_plan(root_group)?;
        debug!(
            "Optimization complete: cost={:.1}, tasks={}",
            plan.cost.total, self.stats.tasks_executed
        );
        Ok(plan)
    }

    /// The memo of the most recent optimization.
    pub fn memo(&self) -> &Memo {
        &self.memo
    }

    /// Scheduler counters of the most recent optimization.
    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;

    #[test]
    fn test_empty_tree() {
        let mut optimizer = Optimizer::new(
            Arc::new(RuleSet::empty()),
            Arc::new(InMemoryCatalog::new()),
            OptimizerConfig::default(),
        );
        assert_eq!(
            optimizer.try_optimize(None).err(),
            Some(OptimizeError::EmptyOperatorTree)
        );
        assert!(optimizer.optimize(None).is_none());
        assert_eq!(optimizer.memo().num_groups(), 0);
    }

    #[test]
    fn test_no_rules_no_plan() {
        let mut optimizer = Optimizer::new(
            Arc::new(RuleSet::empty()),
            Arc::new(InMemoryCatalog::new()),
            OptimizerConfig::default(),
        );
        let tree = OperatorNode::scan(crate::expr::TableRef::new("public", "t"), 1);
        assert_eq!(
            optimizer.try_optimize(Some(&tree)).err(),
            Some(OptimizeError::NoPhysicalAlternative { group: 0 })
        );
        // the memo survives for inspection
        assert_eq!(optimizer.memo().num_groups(), 1);
        assert!(optimizer.stats().tasks_executed > 0);
    }
}
