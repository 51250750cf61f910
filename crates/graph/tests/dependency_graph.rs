use context_graph::{
    BuildOptions, DependencyGraph, DependencyGraphBuilder, Direction, FindRelatedOptions,
    InMemoryImportExtractor, NodeState, SourceFileScanner, SourceImportExtractor,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn graph_from_edges(edges: &[(usize, usize)], files: usize) -> DependencyGraph {
    let mut table: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for &(from, to) in edges {
        table.entry(from).or_default().push(format!("f{to}"));
    }

    let mut extractor = InMemoryImportExtractor::new();
    for (from, targets) in table {
        extractor = extractor.with_imports(format!("f{from}"), targets);
    }

    let names: Vec<String> = (0..files).map(|i| format!("f{i}")).collect();
    DependencyGraphBuilder::from_extractor(extractor)
        .build(&names, &BuildOptions { detect_circular: true })
}

fn edge_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (1usize..12).prop_flat_map(|files| {
        let edges = prop::collection::vec((0..files, 0..files), 0..40);
        (Just(files), edges)
    })
}

proptest! {
    #[test]
    fn adjacency_lists_mirror_each_other((files, edges) in edge_strategy()) {
        let graph = graph_from_edges(&edges, files);

        let mut out_total = 0;
        for file in graph.files() {
            let node = graph.node(file).unwrap();
            let unique: BTreeSet<&String> = node.imports.iter().collect();
            prop_assert_eq!(unique.len(), node.imports.len());
            prop_assert_eq!(node.import_count, node.imports.len());
            out_total += node.imports.len();

            for target in &node.imports {
                prop_assert!(graph.imported_by(target).contains(&file));
            }
            for source in &node.imported_by {
                prop_assert!(graph.imports(source).contains(&file));
            }
        }

        let distinct: BTreeSet<&(usize, usize)> = edges.iter().collect();
        prop_assert_eq!(graph.edge_count(), distinct.len());
        prop_assert_eq!(graph.get_stats().total_imports, out_total);
    }

    #[test]
    fn cycles_are_closed_walks((files, edges) in edge_strategy()) {
        let graph = graph_from_edges(&edges, files);

        for cycle in graph.circular_dependencies().unwrap() {
            prop_assert!(cycle.len() >= 2);
            prop_assert_eq!(cycle.first(), cycle.last());
            for pair in cycle.windows(2) {
                prop_assert!(graph.imports(&pair[0]).contains(&pair[1].as_str()));
            }
        }

        let has_self_loop = edges.iter().any(|(a, b)| a == b);
        if has_self_loop {
            prop_assert!(!graph.circular_dependencies().unwrap().is_empty());
        }
    }

    #[test]
    fn import_chains_follow_edges((files, edges) in edge_strategy(), from in 0usize..12, to in 0usize..12) {
        let graph = graph_from_edges(&edges, files);
        let (from, to) = (format!("f{from}"), format!("f{to}"));

        if let Some(chain) = graph.get_import_chain(&from, &to) {
            prop_assert_eq!(chain.path.first(), Some(&from));
            prop_assert_eq!(chain.path.last(), Some(&to));
            prop_assert_eq!(chain.length, chain.path.len() - 1);
            for pair in chain.path.windows(2) {
                prop_assert!(graph.imports(&pair[0]).contains(&pair[1].as_str()));
            }

            // BFS depth agrees with the chain length
            let related = graph.find_related_files(
                &from,
                &FindRelatedOptions::default()
                    .direction(Direction::Imports)
                    .max_depth(files)
                    .max_files(usize::MAX),
            );
            if chain.length > 0 {
                prop_assert!(related.files_by_depth[&chain.length].contains(&to));
            }
        }
    }

    #[test]
    fn related_files_exclude_start_and_respect_depth((files, edges) in edge_strategy(), start in 0usize..12) {
        let graph = graph_from_edges(&edges, files);
        let start = format!("f{start}");

        let direct = graph.find_related_files(
            &start,
            &FindRelatedOptions::default().max_depth(1).direction(Direction::Imports),
        );
        let mut expected: Vec<&str> = graph.imports(&start).into_iter().filter(|f| *f != start).collect();
        expected.sort_unstable();
        let mut actual: Vec<&str> = direct.all_files.iter().map(String::as_str).collect();
        actual.sort_unstable();
        prop_assert_eq!(actual, expected);

        let wide = graph.find_related_files(&start, &FindRelatedOptions::default());
        prop_assert!(!wide.all_files.contains(&start));
        prop_assert!(wide.files_by_depth.keys().all(|depth| (1..=2).contains(depth)));
        prop_assert_eq!(wide.count, wide.all_files.len());
    }
}

#[test]
fn import_chain_prefers_the_first_shortest_path() {
    let graph = DependencyGraphBuilder::from_extractor(
        InMemoryImportExtractor::new()
            .with_imports("A", ["B", "C"])
            .with_imports("B", ["D", "E"])
            .with_imports("C", ["E"]),
    )
    .build(&["A", "B", "C"], &BuildOptions::default());

    let chain = graph.get_import_chain("A", "D").unwrap();
    assert_eq!(chain.path, vec!["A", "B", "D"]);
    assert_eq!(chain.length, 2);
    assert!(graph.get_import_chain("D", "A").is_none());
}

#[test]
fn mutual_imports_form_a_cycle() {
    let graph = DependencyGraphBuilder::from_extractor(
        InMemoryImportExtractor::new()
            .with_imports("F", ["G"])
            .with_imports("G", ["F"]),
    )
    .build(&["F", "G"], &BuildOptions::default());

    let cycles = graph.detect_circular_dependencies();
    assert!(cycles
        .iter()
        .any(|cycle| cycle.contains(&"F".to_string()) && cycle.contains(&"G".to_string())));
}

#[test]
fn project_on_disk_builds_a_graph() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("src/services")).unwrap();
    fs::write(
        root.join("src/index.ts"),
        "import { api } from './services/api';\nexport { api };\n",
    )
    .unwrap();
    fs::write(
        root.join("src/services/api.ts"),
        "import { db } from '../db';\nimport axios from 'axios';\n",
    )
    .unwrap();
    fs::write(root.join("src/db.ts"), "import { api } from './services/api';\n").unwrap();
    fs::write(root.join("src/orphan.ts"), "export const x = 1;\n").unwrap();

    let files = SourceFileScanner::new(root).scan_paths();
    assert_eq!(files.len(), 4);

    let graph = DependencyGraphBuilder::from_extractor(SourceImportExtractor::new())
        .build(&files, &BuildOptions { detect_circular: true });

    let key = |relative: &str| root.join(relative).to_string_lossy().into_owned();
    let index = key("src/index.ts");
    let api = key("src/services/api.ts");
    let db = key("src/db.ts");
    let orphan = key("src/orphan.ts");

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.imports(&index), vec![api.as_str()]);
    assert_eq!(graph.imports(&api), vec![db.as_str()]);
    assert_eq!(graph.node(&db).unwrap().state, NodeState::Scanned);

    let chain = graph.get_import_chain(&index, &db).unwrap();
    assert_eq!(chain.path, vec![index.clone(), api.clone(), db.clone()]);

    let cycles = graph.circular_dependencies().unwrap();
    assert_eq!(cycles.len(), 1);
    assert!(cycles[0].contains(&api) && cycles[0].contains(&db));

    let stats = graph.get_stats();
    assert_eq!(stats.isolated_files, vec![orphan]);
    assert_eq!(stats.circular_dependency_count, 1);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["totalFiles"], 4);
    assert!(json.get("mostImportedBy").is_some());
}

#[test]
fn dot_relative_root_keeps_scanner_keys() {
    init_logging();
    let dir = tempfile::Builder::new().prefix("dot_root_").tempdir_in(".").unwrap();
    let name = dir.path().file_name().unwrap().to_string_lossy().into_owned();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/a.ts"), "import { b } from './b';\n").unwrap();
    fs::write(dir.path().join("src/b.ts"), "export const b = 1;\n").unwrap();

    let files = SourceFileScanner::new(format!("./{name}")).scan_paths();
    let a = format!("./{name}/src/a.ts");
    let b = format!("./{name}/src/b.ts");
    assert_eq!(files, vec![a.clone(), b.clone()]);

    let graph = DependencyGraphBuilder::from_extractor(SourceImportExtractor::new())
        .build(&files, &BuildOptions::default());

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.imports(&a), vec![b.as_str()]);
    assert_eq!(graph.imported_by(&b), vec![a.as_str()]);
    assert_eq!(graph.node(&b).unwrap().state, NodeState::Scanned);
}
