use std::collections::HashSet;

/// Undirected connection between two landmark indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshEdge(pub usize, pub usize);

impl MeshEdge {
    /// Same edge with the smaller index first.
    pub fn normalized(self) -> Self {
        if self.0 <= self.1 {
            self
        } else {
            MeshEdge(self.1, self.0)
        }
    }

    /// True when both endpoints exist in a set of `len` landmarks.
    pub fn fits(&self, len: usize) -> bool {
        self.0 < len && self.1 < len
    }
}

/// Set of mesh edges drawn as the base tessellation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshTopology {
    edges: Vec<MeshEdge>,
}

impl MeshTopology {
    /// Builds a topology, dropping self-loops and repeated edges (in either
    /// direction) while keeping first-seen order.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = MeshEdge>,
    {
        let mut seen = HashSet::new();
        let edges = edges
            .into_iter()
            .filter(|e| e.0 != e.1)
            .filter(|e| seen.insert(e.normalized()))
            .collect();
        Self { edges }
    }

    pub fn edges(&self) -> &[MeshEdge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, edge: MeshEdge) -> bool {
        let edge = edge.normalized();
        self.edges.iter().any(|e| e.normalized() == edge)
    }

    /// Highest landmark index referenced, if any.
    pub fn max_index(&self) -> Option<usize> {
        self.edges.iter().map(|e| e.0.max(e.1)).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_edges_deduplicates_both_directions() {
        let topo = MeshTopology::from_edges([
            MeshEdge(1, 2),
            MeshEdge(2, 1),
            MeshEdge(2, 3),
            MeshEdge(1, 2),
        ]);
        assert_eq!(topo.edges(), &[MeshEdge(1, 2), MeshEdge(2, 3)]);
    }

    #[test]
    fn test_from_edges_drops_self_loops() {
        let topo = MeshTopology::from_edges([MeshEdge(4, 4), MeshEdge(4, 5)]);
        assert_eq!(topo.len(), 1);
    }

    #[test]
    fn test_contains_ignores_direction() {
        let topo = MeshTopology::from_edges([MeshEdge(7, 3)]);
        assert!(topo.contains(MeshEdge(3, 7)));
        assert!(!topo.contains(MeshEdge(3, 8)));
    }

    #[test]
    fn test_fits() {
        assert!(MeshEdge(0, 467).fits(468));
        assert!(!MeshEdge(0, 468).fits(468));
    }

    #[test]
    fn test_max_index() {
        assert_eq!(MeshTopology::default().max_index(), None);
        let topo = MeshTopology::from_edges([MeshEdge(3, 10), MeshEdge(9, 2)]);
        assert_eq!(topo.max_index(), Some(10));
    }
}
