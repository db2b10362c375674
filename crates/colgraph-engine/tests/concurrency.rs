//! Concurrent edge and property writes and row lock contention.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use colgraph_adapters::MemColumnStore;
use colgraph_common::utils::error::NotFoundKind;
use colgraph_engine::{Config, EdgeId, ElementKind, Error, GraphStore, Value, VertexId};

const THREADS: usize = 8;
const EDGES_PER_THREAD: usize = 25;

#[test]
fn test_concurrent_add_edge_loses_nothing() {
    let graph = GraphStore::in_memory(Config::new("test")).unwrap();
    let a = graph.add_vertex().unwrap().id();
    let b = graph.add_vertex().unwrap().id();

    let created: Vec<EdgeId> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    (0..EDGES_PER_THREAD)
                        .map(|_| graph.add_edge(a, b, "knows").unwrap().id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    let total = THREADS * EDGES_PER_THREAD;
    let distinct: HashSet<EdgeId> = created.iter().copied().collect();
    assert_eq!(distinct.len(), total);

    let out: HashSet<EdgeId> = graph
        .get_vertex(a)
        .unwrap()
        .out_edges()
        .unwrap()
        .iter()
        .map(|edge| edge.id())
        .collect();
    let incoming: HashSet<EdgeId> = graph
        .get_vertex(b)
        .unwrap()
        .in_edges()
        .unwrap()
        .iter()
        .map(|edge| edge.id())
        .collect();
    assert_eq!(out, distinct);
    assert_eq!(incoming, distinct);
}

#[test]
fn test_concurrent_edges_in_both_directions() {
    let graph = GraphStore::in_memory(Config::new("test")).unwrap();
    let hub = graph.add_vertex().unwrap().id();
    let spokes: Vec<VertexId> = (0..THREADS)
        .map(|_| graph.add_vertex().unwrap().id())
        .collect();

    thread::scope(|s| {
        for &spoke in &spokes {
            let graph = &graph;
            s.spawn(move || {
                for _ in 0..EDGES_PER_THREAD {
                    graph.add_edge(spoke, hub, "in").unwrap();
                    graph.add_edge(hub, spoke, "out").unwrap();
                }
            });
        }
    });

    let hub = graph.get_vertex(hub).unwrap();
    let total = THREADS * EDGES_PER_THREAD;
    assert_eq!(hub.in_edges().unwrap().len(), total);
    assert_eq!(hub.out_edges().unwrap().len(), total);
    for spoke in spokes {
        let spoke = graph.get_vertex(spoke).unwrap();
        assert_eq!(spoke.out_edges_with_label("in").unwrap().len(), EDGES_PER_THREAD);
        assert_eq!(spoke.in_edges_with_label("out").unwrap().len(), EDGES_PER_THREAD);
    }
}

#[test]
fn test_concurrent_edge_removal() {
    let graph = GraphStore::in_memory(Config::new("test")).unwrap();
    let a = graph.add_vertex().unwrap().id();
    let b = graph.add_vertex().unwrap().id();
    let edges: Vec<EdgeId> = (0..THREADS * 4)
        .map(|_| graph.add_edge(a, b, "knows").unwrap().id())
        .collect();

    thread::scope(|s| {
        for chunk in edges.chunks(4) {
            let graph = &graph;
            s.spawn(move || {
                for &edge in chunk {
                    graph.remove_edge(edge).unwrap();
                }
            });
        }
    });

    assert!(graph.get_vertex(a).unwrap().out_edges().unwrap().is_empty());
    assert!(graph.get_vertex(b).unwrap().in_edges().unwrap().is_empty());
}

#[test]
fn test_concurrent_property_writes_on_distinct_vertices() {
    let graph = GraphStore::in_memory(Config::new("test")).unwrap();
    let index = graph
        .create_automatic_index("people", ElementKind::Vertex, &["age"])
        .unwrap();
    let vertices: Vec<VertexId> = (0..THREADS)
        .map(|_| graph.add_vertex().unwrap().id())
        .collect();

    thread::scope(|s| {
        for &id in &vertices {
            let graph = &graph;
            s.spawn(move || {
                let vertex = graph.get_vertex(id).unwrap();
                for age in 0..20i32 {
                    vertex.set_property("age", age).unwrap();
                }
            });
        }
    });

    assert_eq!(index.count("age", &Value::Int32(19)).unwrap(), THREADS);
    for age in 0..19i32 {
        assert_eq!(index.count("age", &Value::Int32(age)).unwrap(), 0);
    }
}

#[test]
fn test_lock_timeout_is_retryable_and_writes_nothing() {
    let store = Arc::new(MemColumnStore::new());
    let config = Config::new("test").with_lock_timeout(Duration::from_millis(20));
    let graph = GraphStore::open(store.clone(), config).unwrap();
    let a = graph.add_vertex().unwrap().id();
    let b = graph.add_vertex().unwrap().id();

    let held = graph.store().lock_row("test", b.as_bytes(), Duration::from_secs(1)).unwrap();

    let err = graph.add_edge(a, b, "knows").unwrap_err();
    assert!(matches!(err, Error::LockTimeout { .. }));
    assert!(err.is_retryable());
    assert!(!store.is_locked("test", a.as_bytes()));
    assert!(graph.get_vertex(a).unwrap().out_edges().unwrap().is_empty());

    graph.store().unlock_row(held).unwrap();
    graph.add_edge(a, b, "knows").unwrap();
    assert_eq!(graph.get_vertex(b).unwrap().in_edges().unwrap().len(), 1);
}

#[test]
fn test_add_edge_waits_for_a_released_lock() {
    let store = Arc::new(MemColumnStore::new());
    let graph = GraphStore::open(store.clone(), Config::new("test")).unwrap();
    let a = graph.add_vertex().unwrap().id();
    let b = graph.add_vertex().unwrap().id();

    let held = graph.store().lock_row("test", a.as_bytes(), Duration::from_secs(1)).unwrap();
    thread::scope(|s| {
        let writer = s.spawn(|| graph.add_edge(a, b, "knows").map(|edge| edge.id()));
        thread::sleep(Duration::from_millis(20));
        graph.store().unlock_row(held).unwrap();
        let id = writer.join().unwrap().unwrap();
        assert!(graph.get_edge(id).is_ok());
    });
    assert!(!store.is_locked("test", a.as_bytes()));
}

#[test]
fn test_property_write_does_not_revive_a_removed_vertex() {
    let store = Arc::new(MemColumnStore::new());
    let graph = GraphStore::open(store.clone(), Config::new("test")).unwrap();
    let vertex = graph.add_vertex().unwrap();
    let id = vertex.id();

    let held = graph.store().lock_row("test", id.as_bytes(), Duration::from_secs(1)).unwrap();
    thread::scope(|s| {
        let writer = s.spawn(move || vertex.set_property("age", 30i32));
        let swapper = s.spawn(move || vertex.compare_and_set_property("name", None, "Ann"));
        thread::sleep(Duration::from_millis(20));

        // The removal lands while both writers are waiting on the row.
        graph
            .store()
            .delete("test", colgraph_core::Delete::new(id.as_bytes().to_vec()), Some(&held))
            .unwrap();
        graph.store().unlock_row(held).unwrap();

        assert!(matches!(
            writer.join().unwrap(),
            Err(Error::NotFound(NotFoundKind::Vertex))
        ));
        assert!(matches!(
            swapper.join().unwrap(),
            Err(Error::NotFound(NotFoundKind::Vertex))
        ));
    });

    assert!(graph.store().get("test", id.as_bytes()).unwrap().is_empty());
    assert!(graph.get_vertex(id).is_err());
}

#[test]
fn test_property_write_waits_for_the_row_lock() {
    let store = Arc::new(MemColumnStore::new());
    let config = Config::new("test").with_lock_timeout(Duration::from_millis(20));
    let graph = GraphStore::open(store.clone(), config).unwrap();
    let a = graph.add_vertex().unwrap();
    let b = graph.add_vertex().unwrap();
    let edge = graph.add_edge(a.id(), b.id(), "knows").unwrap();

    let held = graph.store().lock_row("test", a.id().as_bytes(), Duration::from_secs(1)).unwrap();
    let err = a.set_property("age", 30i32).unwrap_err();
    assert!(err.is_retryable());
    assert!(edge.set_property("weight", 1i32).unwrap_err().is_retryable());
    assert!(graph.remove_vertex(a.id()).unwrap_err().is_retryable());
    assert_eq!(a.get_property("age").unwrap(), None);
    graph.store().unlock_row(held).unwrap();

    a.set_property("age", 30i32).unwrap();
    edge.set_property("weight", 1i32).unwrap();
    assert_eq!(a.get_property("age").unwrap(), Some(Value::Int32(30)));
}

fn add_edge_retrying(graph: &GraphStore, out: VertexId, into: VertexId) -> EdgeId {
    loop {
        match graph.add_edge(out, into, "knows") {
            Ok(edge) => return edge.id(),
            Err(err) if err.is_retryable() => thread::yield_now(),
            Err(err) => panic!("add_edge failed: {err}"),
        }
    }
}

#[test]
fn test_opposing_edges_complete_with_retries() {
    let config = Config::new("test").with_lock_timeout(Duration::from_millis(5));
    let graph = GraphStore::in_memory(config).unwrap();
    let a = graph.add_vertex().unwrap().id();
    let b = graph.add_vertex().unwrap().id();

    thread::scope(|s| {
        for i in 0..THREADS {
            let graph = &graph;
            let (out, into) = if i % 2 == 0 { (a, b) } else { (b, a) };
            s.spawn(move || {
                for _ in 0..EDGES_PER_THREAD {
                    add_edge_retrying(graph, out, into);
                }
            });
        }
    });

    let per_direction = THREADS / 2 * EDGES_PER_THREAD;
    let a = graph.get_vertex(a).unwrap();
    let b = graph.get_vertex(b).unwrap();
    assert_eq!(a.out_edges().unwrap().len(), per_direction);
    assert_eq!(a.in_edges().unwrap().len(), per_direction);
    assert_eq!(b.out_edges().unwrap().len(), per_direction);
    assert_eq!(b.in_edges().unwrap().len(), per_direction);
}
