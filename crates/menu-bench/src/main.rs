use std::io;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use menu_dnd::DndConfig;
use menu_dnd::dnd::{DragEligibility, DropPosition, GroupedReorder, reorder};
use menu_dnd::expand::ExpandedSet;
use menu_dnd::registry::{IdentityRegistry, MenuCategory, MenuLabel, MenuTree};
use menu_dnd::selection::{KeySelection, SelectionModel, SelectionStore};
use ratatui::layout::{Position, Rect};

#[derive(Parser, Debug)]
#[command(
    name = "menu-bench",
    version = env!("CARGO_PKG_VERSION"),
    about = "Times registry build, range selection, eligibility, and reorder on a synthetic menu"
)]
struct BenchCli {
    /// Number of labels in the synthetic menu.
    #[arg(short = 'l', long = "labels", value_name = "COUNT", default_value_t = 200)]
    labels: usize,

    /// Categories under each label.
    #[arg(short = 'c', long = "categories", value_name = "COUNT", default_value_t = 25)]
    categories: usize,

    /// Repetitions per phase.
    #[arg(short = 'i', long = "iterations", value_name = "COUNT", default_value_t = 50)]
    iterations: usize,

    /// Seed for anchor and target picks. Defaults to the clock.
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,
}

struct BenchConfig {
    labels: usize,
    categories: usize,
    iterations: usize,
    seed: u64,
}

impl TryFrom<&BenchCli> for BenchConfig {
    type Error = String;

    fn try_from(cli: &BenchCli) -> Result<Self, Self::Error> {
        if !(1..=100_000).contains(&cli.labels) {
            return Err("labels must be between 1 and 100000".to_string());
        }
        if cli.categories > 10_000 {
            return Err("categories must be at most 10000".to_string());
        }
        if !(1..=100_000).contains(&cli.iterations) {
            return Err("iterations must be between 1 and 100000".to_string());
        }
        let seed = cli.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0)
                ^ 0xA5A5_A5A5_1234_5678
        });
        Ok(Self {
            labels: cli.labels,
            categories: cli.categories,
            iterations: cli.iterations,
            seed,
        })
    }
}

fn main() -> io::Result<()> {
    let args = BenchCli::parse();
    let config = BenchConfig::try_from(&args)
        .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

    let tree = synthetic_tree(&config);
    let mut expanded = ExpandedSet::new();
    expanded.expand_all(tree.label_order());
    let mut picks = Picker::new(config.seed);

    let build = Phase::run(config.iterations, || {
        let (rows, registry) = tree.rows(&expanded);
        (rows.len(), registry.len())
    });
    let (_, registry) = tree.rows(&expanded);

    let range = Phase::run(config.iterations, || range_select_once(&registry, &mut picks));
    let eligibility = Phase::run(config.iterations, || eligibility_once(&registry));
    let order = tree.label_order();
    let reorder_phase = Phase::run(config.iterations, || reorder_once(&order, &mut picks));
    let hover = Phase::run(config.iterations, || hover_once(&order, &mut picks));

    println!(
        "{}",
        indoc::formatdoc!(
            r#"
            Menu bench: {labels} labels x {categories} categories ({rows} rows), {iterations} iterations, seed {seed:#x}
            {build}
            {range}
            {eligibility}
            {reorder}
            {hover}
            "#,
            labels = config.labels,
            categories = config.categories,
            rows = registry.all_keys().len(),
            iterations = config.iterations,
            seed = config.seed,
            build = build.report("registry build"),
            range = range.report("range select"),
            eligibility = eligibility.report("eligibility"),
            reorder = reorder_phase.report("label reorder"),
            hover = hover.report("drag hover x100"),
        )
    );
    Ok(())
}

fn synthetic_tree(config: &BenchConfig) -> MenuTree {
    let labels = (0..config.labels)
        .map(|l| {
            let categories = (0..config.categories)
                .map(|c| MenuCategory::new(format!("c{l}-{c}"), c as i64))
                .collect();
            MenuLabel::new(format!("l{l}"), l as i64).with_categories(categories)
        })
        .collect();
    MenuTree::new(labels)
}

fn range_select_once(registry: &IdentityRegistry, picks: &mut Picker) -> isize {
    let keys = registry.all_keys();
    let mut model = SelectionModel::hierarchy();
    let mut store = KeySelection::new();
    let anchor = &keys[picks.below(keys.len())];
    let target = &keys[picks.below(keys.len())];
    model.on_toggle(&mut store, anchor);
    model.range_select(registry, &mut store, target)
}

fn eligibility_once(registry: &IdentityRegistry) -> usize {
    let mut model = SelectionModel::hierarchy();
    let mut store = KeySelection::new();
    model.on_select_all(registry, &mut store);
    let snapshot = model.snapshot(registry, &store);
    let eligibility = DragEligibility::from_snapshot(&snapshot, registry);
    eligibility.drag_count() + store.selected_keys().len()
}

fn reorder_once(order: &[String], picks: &mut Picker) -> usize {
    let start = picks.below(order.len());
    let end = (start + 5).min(order.len());
    let dragged = &order[start..end];
    let target = &order[picks.below(order.len())];
    reorder(order, dragged, target, Default::default()).len()
}

fn hover_once(order: &[String], picks: &mut Picker) -> usize {
    let registry = IdentityRegistry::flat("label", order.iter());
    let mut model = SelectionModel::flat();
    let mut store = KeySelection::new();
    let first = registry.all_keys()[picks.below(order.len())].clone();
    model.on_toggle(&mut store, &first);
    let eligibility = DragEligibility::from_snapshot(&model.snapshot(&registry, &store), &registry);
    let Some(primary) = eligibility.dragged_entities.first().map(|e| e.entity_id.clone()) else {
        return 0;
    };

    let mut engine = GroupedReorder::new(&DndConfig::default());
    engine.set_eligibility(eligibility);
    engine.drag_start(&primary);
    let row = Rect::new(0, 0, 80, 1);
    let start = Instant::now();
    for step in 0..100u64 {
        let target = &order[picks.below(order.len())];
        let pointer = Position::new(picks.below(80) as u16, 0);
        let position = DropPosition::from_pointer(pointer, row);
        engine.drag_over(target, position, start + Duration::from_millis(step * 16));
    }
    engine.tick(start + Duration::from_secs(2));
    let committed = usize::from(engine.session().is_some_and(|s| s.drag_over_id.is_some()));
    engine.drag_end();
    committed
}

struct Phase {
    samples: Vec<Duration>,
}

impl Phase {
    fn run<T>(iterations: usize, mut body: impl FnMut() -> T) -> Self {
        let mut samples = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            let started = Instant::now();
            std::hint::black_box(body());
            samples.push(started.elapsed());
        }
        Self { samples }
    }

    fn average_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let total: Duration = self.samples.iter().sum();
        (total.as_secs_f64() / self.samples.len() as f64) * 1_000.0
    }

    fn fastest_ms(&self) -> f64 {
        self.samples
            .iter()
            .min()
            .map_or(0.0, |d| d.as_secs_f64() * 1_000.0)
    }

    fn slowest_ms(&self) -> f64 {
        self.samples
            .iter()
            .max()
            .map_or(0.0, |d| d.as_secs_f64() * 1_000.0)
    }

    fn report(&self, name: &str) -> String {
        format!(
            "{name:<16} avg {avg:>8.3} ms | best {best:>8.3} ms | worst {worst:>8.3} ms",
            avg = self.average_ms(),
            best = self.fastest_ms(),
            worst = self.slowest_ms(),
        )
    }
}

/// Linear congruential picks; reproducible for a given seed.
struct Picker {
    state: u64,
}

impl Picker {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        self.next() as usize % bound
    }
}
