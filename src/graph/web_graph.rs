use crate::graph::{WebEdge, WebVertex};
use crate::state::WebPage;
use std::collections::{BTreeMap, HashMap};

/// A shard-local link graph with one designated focus vertex
///
/// Vertices live in a map keyed by URL and edges in a flat list; at most one
/// edge exists per (source, target) pair.
#[derive(Debug, Clone, Default)]
pub struct WebGraph {
    vertices: BTreeMap<String, WebVertex>,
    edges: Vec<WebEdge>,
    edge_index: HashMap<(String, String), usize>,
    focus: Option<String>,
}

impl WebGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex, attaching its page to an existing page-less vertex
    pub fn add_vertex(&mut self, vertex: WebVertex) {
        match self.vertices.get_mut(&vertex.url) {
            Some(existing) => {
                if existing.page.is_none() && vertex.page.is_some() {
                    existing.page = vertex.page;
                }
            }
            None => {
                self.vertices.insert(vertex.url.clone(), vertex);
            }
        }
    }

    /// Adds an edge between two vertices, adding the vertices as needed
    ///
    /// If the edge already exists the existing one is returned unchanged.
    pub fn add_edge(&mut self, source: WebVertex, target: WebVertex) -> &mut WebEdge {
        let edge = WebEdge::new(source.url.clone(), target.url.clone());
        self.add_vertex(source);
        self.add_vertex(target);
        self.insert_edge(edge)
    }

    /// Inserts a prepared edge; endpoints missing from the graph are added without pages
    pub fn insert_edge(&mut self, edge: WebEdge) -> &mut WebEdge {
        let key = (edge.source.clone(), edge.target.clone());
        if let Some(&index) = self.edge_index.get(&key) {
            return &mut self.edges[index];
        }

        for url in [&edge.source, &edge.target] {
            if !self.vertices.contains_key(url) {
                self.vertices.insert(url.clone(), WebVertex::new(url.clone()));
            }
        }

        let index = self.edges.len();
        self.edges.push(edge);
        self.edge_index.insert(key, index);
        &mut self.edges[index]
    }

    // ===== Vertices =====

    pub fn vertex(&self, url: &str) -> Option<&WebVertex> {
        self.vertices.get(url)
    }

    pub fn page(&self, url: &str) -> Option<&WebPage> {
        self.vertices.get(url).and_then(|v| v.page.as_ref())
    }

    /// Detaches and returns the page attached to a vertex
    pub fn take_page(&mut self, url: &str) -> Option<WebPage> {
        self.vertices.get_mut(url).and_then(|v| v.page.take())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    // ===== Edges =====

    pub fn edges(&self) -> &[WebEdge] {
        &self.edges
    }

    pub fn first_edge(&self) -> Option<&WebEdge> {
        self.edges.first()
    }

    pub fn incoming_edges<'a>(&'a self, url: &'a str) -> impl Iterator<Item = &'a WebEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == url)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ===== Focus =====

    pub fn focus(&self) -> Option<&WebVertex> {
        self.focus.as_deref().and_then(|url| self.vertices.get(url))
    }

    pub fn focus_url(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// Makes `url` the focus, adding a page-less vertex for it if needed
    pub fn set_focus(&mut self, url: &str) {
        if !self.vertices.contains_key(url) {
            self.vertices
                .insert(url.to_string(), WebVertex::new(url.to_string()));
        }
        self.focus = Some(url.to_string());
    }

    // ===== Shards =====

    /// Builds the one-edge graph holding `edge` and clones of both endpoints
    ///
    /// The target becomes the focus of the returned graph.
    pub fn subgraph_of(&self, edge: &WebEdge) -> WebGraph {
        let mut subgraph = WebGraph::new();

        let source = self
            .vertices
            .get(&edge.source)
            .cloned()
            .unwrap_or_else(|| WebVertex::new(edge.source.clone()));
        subgraph.add_vertex(source);

        if !edge.is_loop() {
            let target = self
                .vertices
                .get(&edge.target)
                .cloned()
                .unwrap_or_else(|| WebVertex::new(edge.target.clone()));
            subgraph.add_vertex(target);
        }

        subgraph.insert_edge(edge.clone());
        subgraph.focus = Some(edge.target.clone());
        subgraph
    }

    /// Merges another graph's vertices and edges into this one
    ///
    /// Pages attach to vertices that had none; duplicate edges keep the
    /// first weight and anchor seen. The focus is left unchanged.
    pub fn merge(&mut self, other: WebGraph) {
        for (_, vertex) in other.vertices {
            self.add_vertex(vertex);
        }
        for edge in other.edges {
            self.insert_edge(edge);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_at_depth(depth: u32) -> WebPage {
        WebPage {
            depth,
            ..WebPage::default()
        }
    }

    #[test]
    fn test_add_edge_adds_vertices() {
        let mut graph = WebGraph::new();
        graph
            .add_edge(WebVertex::new("http://a.com/"), WebVertex::new("http://b.com/"))
            .anchor = "to b".to_string();

        assert_eq!(graph.vertex_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.incoming_edges("http://b.com/").count(), 1);
        assert_eq!(graph.first_edge().unwrap().anchor, "to b");
    }

    #[test]
    fn test_duplicate_edge_is_lenient() {
        let mut graph = WebGraph::new();
        graph
            .add_edge(WebVertex::new("http://a.com/"), WebVertex::new("http://b.com/"))
            .weight = 1.0;
        let again = graph.add_edge(WebVertex::new("http://a.com/"), WebVertex::new("http://b.com/"));

        assert_eq!(again.weight, 1.0);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_page_attaches_to_bare_vertex() {
        let mut graph = WebGraph::new();
        graph.add_vertex(WebVertex::new("http://a.com/"));
        graph.add_vertex(WebVertex::with_page("http://a.com/", page_at_depth(3)));

        assert_eq!(graph.page("http://a.com/").unwrap().depth, 3);

        // An attached page is never replaced
        graph.add_vertex(WebVertex::with_page("http://a.com/", page_at_depth(7)));
        assert_eq!(graph.page("http://a.com/").unwrap().depth, 3);
    }

    #[test]
    fn test_self_loop() {
        let mut graph = WebGraph::new();
        let v = WebVertex::with_page("http://a.com/", page_at_depth(0));
        graph.add_edge(v.clone(), v);

        assert_eq!(graph.vertex_count(), 1);
        assert!(graph.first_edge().unwrap().is_loop());
        assert_eq!(graph.incoming_edges("http://a.com/").count(), 1);
    }

    #[test]
    fn test_subgraph_of_keeps_source_payload() {
        let mut graph = WebGraph::new();
        let a = WebVertex::with_page("http://a.com/", page_at_depth(0));
        graph.add_vertex(a.clone());
        graph.add_edge(a, WebVertex::new("http://b.com/")).weight = 0.5;
        graph.add_edge(WebVertex::new("http://a.com/"), WebVertex::new("http://c.com/"));

        let edge = graph.edges()[0].clone();
        let shard = graph.subgraph_of(&edge);

        assert_eq!(shard.edge_count(), 1);
        assert_eq!(shard.vertex_count(), 2);
        assert_eq!(shard.focus_url(), Some("http://b.com/"));
        assert!(shard.page("http://a.com/").is_some());
        assert!(shard.page("http://b.com/").is_none());
        assert_eq!(shard.first_edge().unwrap().weight, 0.5);
    }

    #[test]
    fn test_merge_shards_into_neighbourhood() {
        let mut a = WebGraph::new();
        a.add_edge(
            WebVertex::with_page("http://a.com/", page_at_depth(1)),
            WebVertex::new("http://t.com/"),
        );

        let mut b = WebGraph::new();
        b.add_edge(
            WebVertex::with_page("http://b.com/", page_at_depth(2)),
            WebVertex::new("http://t.com/"),
        );

        let mut own = WebGraph::new();
        let t = WebVertex::with_page("http://t.com/", page_at_depth(5));
        own.add_edge(t.clone(), t);

        let mut graph = WebGraph::new();
        graph.merge(a);
        graph.merge(b);
        graph.merge(own);
        graph.set_focus("http://t.com/");

        assert_eq!(graph.incoming_edges("http://t.com/").count(), 3);
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.focus().unwrap().page.as_ref().unwrap().depth, 5);
    }

    #[test]
    fn test_take_page() {
        let mut graph = WebGraph::new();
        graph.add_vertex(WebVertex::with_page("http://a.com/", page_at_depth(0)));
        graph.set_focus("http://a.com/");

        assert!(graph.take_page("http://a.com/").is_some());
        assert!(graph.take_page("http://a.com/").is_none());
        assert!(graph.focus().is_some());
    }

    #[test]
    fn test_set_focus_adds_vertex() {
        let mut graph = WebGraph::new();
        graph.set_focus("http://x.com/");
        assert!(graph.vertex("http://x.com/").is_some());
        assert!(!graph.focus().unwrap().has_page());
        assert_eq!(graph.vertex_count(), 1);
        assert_eq!(graph.edge_count(), 0);
    }
}
