use std::collections::BinaryHeap;

use aislepath_core::Point;
use ordered_float::OrderedFloat;

use crate::maps::{DistanceMap, PredecessorMap, SourceMaps};
use crate::search::{NodeRef, SearchRange};
use crate::traits::WeightedPather;

impl SearchRange {
    /// Compute single-source Dijkstra distance and predecessor maps.
    ///
    /// Neighbours are relaxed in the order the pather yields them and a cell
    /// only changes parent on a strictly cheaper cost, so equal-cost routes
    /// resolve the same way on every run. A source outside the range yields
    /// empty maps.
    pub fn dijkstra<P>(&mut self, pather: &P, source: Point) -> SourceMaps
    where
        P: WeightedPather + ?Sized,
    {
        let cur_gen = self.next_generation();
        let mut open: BinaryHeap<NodeRef> = BinaryHeap::new();
        let mut seq = 0u64;

        if let Some(si) = self.idx(source) {
            let n = &mut self.nodes[si];
            n.g = 0.0;
            n.parent = usize::MAX;
            n.generation = cur_gen;
            n.open = true;
            open.push(NodeRef {
                idx: si,
                g: OrderedFloat(0.0),
                seq,
            });
        }

        let mut nbuf = std::mem::take(&mut self.nbuf);

        while let Some(current) = open.pop() {
            let ci = current.idx;
            let cn = &self.nodes[ci];
            if cn.generation != cur_gen || !cn.open || cn.g < current.g.0 {
                continue;
            }
            let current_g = cn.g;
            self.nodes[ci].open = false;
            self.settled.push(ci);

            let cp = self.point(ci);
            nbuf.clear();
            pather.neighbors(cp, &mut nbuf);

            for &np in nbuf.iter() {
                let Some(ni) = self.idx(np) else {
                    continue;
                };
                let tentative = current_g + pather.cost(cp, np);
                if !tentative.is_finite() {
                    continue;
                }

                let n = &mut self.nodes[ni];
                if n.generation == cur_gen {
                    if !n.open || tentative >= n.g {
                        continue;
                    }
                } else {
                    n.generation = cur_gen;
                }

                n.g = tentative;
                n.parent = ci;
                n.open = true;
                seq += 1;
                open.push(NodeRef {
                    idx: ni,
                    g: OrderedFloat(tentative),
                    seq,
                });
            }
        }

        self.nbuf = nbuf;
        self.collect(source)
    }

    /// Copy the settled nodes of the last search into sparse maps.
    fn collect(&self, source: Point) -> SourceMaps {
        let mut distances = DistanceMap::with_capacity(self.settled.len());
        let mut predecessors = PredecessorMap::with_capacity(self.settled.len());
        for &i in &self.settled {
            let node = &self.nodes[i];
            let p = self.point(i);
            distances.insert(p, node.g);
            if node.parent != usize::MAX {
                predecessors.insert(p, self.point(node.parent));
            }
        }
        SourceMaps {
            source,
            distances,
            predecessors,
        }
    }
}
