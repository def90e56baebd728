use super::*;

fn graph_with(nodes: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for node in nodes {
        graph.add_node(GraphNode::model(*node)).unwrap();
    }
    for (dependent, dependency) in edges {
        graph.add_edge(dependent, dependency).unwrap();
    }
    graph
}

fn ids(order: &[&GraphNode]) -> Vec<String> {
    order.iter().map(|n| n.id.clone()).collect()
}

fn position(order: &[String], id: &str) -> usize {
    order.iter().position(|m| m == id).unwrap()
}

#[test]
fn test_dependencies_precede_dependents() {
    let graph = graph_with(
        &["fct_orders", "stg_orders", "stg_customers"],
        &[
            ("fct_orders", "stg_orders"),
            ("fct_orders", "stg_customers"),
        ],
    );
    let order = ids(&topological_sort(&graph).unwrap());

    assert_eq!(order.len(), 3);
    assert!(position(&order, "fct_orders") > position(&order, "stg_orders"));
    assert!(position(&order, "fct_orders") > position(&order, "stg_customers"));
}

#[test]
fn test_linear_chain() {
    let graph = graph_with(&["c", "b", "a"], &[("c", "b"), ("b", "a")]);
    let order = ids(&topological_sort(&graph).unwrap());
    assert_eq!(order, vec!["a", "b", "c"]);
}

#[test]
fn test_ties_follow_insertion_order() {
    let graph = graph_with(&["zeta", "alpha", "mid"], &[]);
    let order = ids(&topological_sort(&graph).unwrap());
    assert_eq!(order, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_freed_nodes_respect_insertion_order() {
    // d and b both become ready once a runs; b was added first.
    let graph = graph_with(&["a", "b", "c", "d"], &[("d", "a"), ("b", "a"), ("c", "d")]);
    let order = ids(&topological_sort(&graph).unwrap());
    assert_eq!(order, vec!["a", "b", "d", "c"]);
}

#[test]
fn test_order_is_deterministic() {
    let build = || {
        graph_with(
            &["raw", "stg_a", "stg_b", "int", "fct"],
            &[
                ("stg_a", "raw"),
                ("stg_b", "raw"),
                ("int", "stg_a"),
                ("int", "stg_b"),
                ("fct", "int"),
            ],
        )
    };
    let first = ids(&topological_sort(&build()).unwrap());
    for _ in 0..10 {
        assert_eq!(ids(&topological_sort(&build()).unwrap()), first);
    }
}

#[test]
fn test_circular_dependency() {
    let graph = graph_with(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
    let err = topological_sort(&graph).unwrap_err();
    match err {
        CoreError::CircularDependency { cycle } => {
            assert!(cycle.contains('a') && cycle.contains('b') && cycle.contains('c'));
            let parts: Vec<&str> = cycle.split(" -> ").collect();
            assert_eq!(parts.first(), parts.last());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let graph = graph_with(&["a", "b"], &[("a", "a")]);
    let err = topological_sort(&graph).unwrap_err();
    assert!(matches!(err, CoreError::CircularDependency { ref cycle } if cycle == "a -> a"));
}

#[test]
fn test_cycle_downstream_of_acyclic_part() {
    let graph = graph_with(
        &["root", "x", "y"],
        &[("x", "root"), ("x", "y"), ("y", "x")],
    );
    assert!(matches!(
        topological_sort(&graph),
        Err(CoreError::CircularDependency { .. })
    ));
}

#[test]
fn test_duplicate_node_rejected() {
    let mut graph = DependencyGraph::new();
    graph.add_node(GraphNode::model("a")).unwrap();
    let err = graph.add_node(GraphNode::model("a")).unwrap_err();
    assert!(matches!(err, CoreError::DuplicateNode { ref id } if id == "a"));
}

#[test]
fn test_edge_to_unknown_node_rejected() {
    let mut graph = graph_with(&["a"], &[]);

    let err = graph.add_edge("a", "missing").unwrap_err();
    assert!(matches!(err, CoreError::UnknownNode { ref missing, .. } if missing == "missing"));

    let err = graph.add_edge("ghost", "a").unwrap_err();
    assert!(matches!(err, CoreError::UnknownNode { ref missing, .. } if missing == "ghost"));
}

#[test]
fn test_duplicate_edge_is_noop() {
    let mut graph = graph_with(&["a", "b"], &[("b", "a")]);
    graph.add_edge("b", "a").unwrap();
    assert_eq!(graph.dependencies("b"), vec!["a"]);
    assert_eq!(graph.dependents("a"), vec!["b"]);
}

#[test]
fn test_node_metadata() {
    let mut graph = DependencyGraph::new();
    graph
        .add_node(GraphNode::new("raw_orders", NodeKind::Source).with_name("Raw orders"))
        .unwrap();
    let node = graph.node("raw_orders").unwrap();
    assert_eq!(node.kind, NodeKind::Source);
    assert_eq!(node.name, "Raw orders");
    assert!(graph.contains("raw_orders"));
    assert_eq!(graph.len(), 1);
    assert!(graph.node("other").is_none());
}

#[test]
fn test_empty_graph_sorts_to_empty() {
    let graph = DependencyGraph::new();
    assert!(graph.is_empty());
    assert!(topological_sort(&graph).unwrap().is_empty());
}
