//! Implementation of an in-memory kd tree over skeleton endpoints, used to find endpoint pairs
//! closer than a physical distance without comparing every pair.
//!
//! Internal nodes of the tree do not contain points, only pointers to children. Leaf pages
//! contain records with the owning skeleton, the endpoint index and the physical position.

use std::collections::VecDeque;

use crate::data::{Resolution, Skeleton};

pub const DEFAULT_LEAF_CAPACITY: usize = 32;

const DIMENSIONS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum PagePointer {
    Node(usize),
    Leaf(usize),
}

#[derive(Debug, PartialEq, Clone)]
pub struct InternalNode {
    pub left_child_pointer: PagePointer,
    pub right_child_pointer: PagePointer,
    pub split_axis: usize,
    pub split_value: f64,
}

/// One endpoint stored in the tree.
#[derive(Debug, PartialEq, Clone)]
pub struct TreeRecord {
    /// Position of the owning skeleton in the generator's input.
    pub skeleton: usize,
    /// Position of the endpoint within its skeleton.
    pub endpoint: usize,
    /// Physical coordinate (z, y, x) in nanometers.
    pub point: [f64; DIMENSIONS],
}

impl TreeRecord {

    pub fn distance(&self, point: &[f64; DIMENSIONS]) -> f64 {

        let mut sum: f64 = 0.0;
        for i in 0..DIMENSIONS {
            sum += (self.point[i] - point[i]).powi(2);
        }

        return sum.sqrt();
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordPage {
    pub records: Vec<TreeRecord>,
}

#[derive(Debug)]
enum Direction {
    Left,
    Right,
}

#[derive(Debug)]
enum NodeAction {
    CheckIgnoredBranch,
    Descend,
}

#[derive(Debug)]
pub struct EndpointTree {
    nodes: Vec<InternalNode>,
    pages: Vec<RecordPage>,
    root: PagePointer,
    leaf_capacity: usize,
}

impl EndpointTree {

    pub fn new(leaf_capacity: usize) -> Self {

        return Self {
            nodes: Vec::new(),
            pages: vec![RecordPage::default()],
            root: PagePointer::Leaf(0),
            leaf_capacity: leaf_capacity.max(1),
        };
    }

    /// Builds a tree holding every endpoint of every skeleton, scaled by `resolution`.
    pub fn from_skeletons(resolution: &Resolution, skeletons: &[Skeleton], leaf_capacity: usize) -> Self {

        let mut tree = Self::new(leaf_capacity);

        for (skeleton_index, skeleton) in skeletons.iter().enumerate() {
            for (endpoint_index, endpoint) in skeleton.endpoints.iter().enumerate() {
                tree.add_record(TreeRecord {
                    skeleton: skeleton_index,
                    endpoint: endpoint_index,
                    point: resolution.to_physical(endpoint),
                });
            }
        }

        return tree;
    }

    pub fn num_nodes(&self) -> usize {
        return self.nodes.len();
    }

    pub fn num_pages(&self) -> usize {
        return self.pages.len();
    }

    pub fn len(&self) -> usize {
        return self.pages.iter().map(|page| page.records.len()).sum();
    }

    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Length of the longest root to leaf path, counting internal nodes.
    pub fn depth(&self) -> usize {

        let mut max_depth = 0;
        let mut to_visit: Vec<(PagePointer, usize)> = vec![(self.root.clone(), 0)];

        while let Some((pointer, depth)) = to_visit.pop() {
            match pointer {
                PagePointer::Leaf(_) => max_depth = max_depth.max(depth),
                PagePointer::Node(index) => {
                    let node = &self.nodes[index];
                    to_visit.push((node.left_child_pointer.clone(), depth + 1));
                    to_visit.push((node.right_child_pointer.clone(), depth + 1));
                }
            }
        }

        return max_depth;
    }

    ///Adds the record to the tree. Descends down the tree until a leaf page is found, and appends
    ///the record to that page. If this overfills the page, the page is split at its median and a
    ///new internal node is created to point to the two halves.
    pub fn add_record(&mut self, record: TreeRecord) {

        let mut curr_pointer = self.root.clone();
        let mut parent_pointer: Option<PagePointer> = None;
        let mut last_was_left = true;

        loop {
            match curr_pointer {
                PagePointer::Leaf(index) => {

                    self.pages[index].records.push(record);

                    if self.pages[index].records.len() > self.leaf_capacity {
                        self.split(index, parent_pointer, last_was_left);
                    }

                    break;
                },
                PagePointer::Node(index) => {

                    let node = &self.nodes[index];
                    let this_value = record.point[node.split_axis];

                    parent_pointer = Some(curr_pointer.clone());

                    match this_value <= node.split_value {
                        true => {
                            last_was_left = true;
                            curr_pointer = node.left_child_pointer.clone();
                        },
                        false => {
                            last_was_left = false;
                            curr_pointer = node.right_child_pointer.clone();
                        },
                    }
                }
            }
        }
    }

    /// Splits an overfull page along the axis after its parent's. Axes on which every record
    /// agrees are skipped; a page of identical points is left overfull.
    fn split(&mut self, page_index: usize, parent_pointer: Option<PagePointer>, last_was_left: bool) {

        let parent_index = match parent_pointer {
            Some(PagePointer::Node(index)) => Some(index),
            _ => None,
        };

        let first_axis = match parent_index {
            Some(index) => (self.nodes[index].split_axis + 1) % DIMENSIONS,
            None => 0,
        };

        let split = (0..DIMENSIONS)
            .map(|offset| (first_axis + offset) % DIMENSIONS)
            .find_map(|axis| median_split(&self.pages[page_index].records, axis).map(|value| (axis, value)));

        let (split_axis, split_value) = match split {
            Some(x) => x,
            None => return,
        };

        let records = std::mem::take(&mut self.pages[page_index].records);
        let (left_records, right_records): (Vec<TreeRecord>, Vec<TreeRecord>) = records
            .into_iter()
            .partition(|record| record.point[split_axis] <= split_value);

        //left half stays at the current page, right half goes to a new one
        self.pages[page_index].records = left_records;
        self.pages.push(RecordPage { records: right_records });
        let right_child_pointer = PagePointer::Leaf(self.pages.len() - 1);

        let this_pointer = PagePointer::Leaf(page_index);
        self.nodes.push(InternalNode {
            left_child_pointer: this_pointer.clone(),
            right_child_pointer,
            split_axis,
            split_value,
        });
        let pointer = PagePointer::Node(self.nodes.len() - 1);

        match parent_index {
            Some(index) => {
                let parent = &mut self.nodes[index];
                match last_was_left {
                    true => parent.left_child_pointer = pointer.clone(),
                    false => parent.right_child_pointer = pointer.clone(),
                }
            },
            None => {},
        }

        if self.root == this_pointer {
            self.root = pointer;
        }
    }

    fn dist_to_axis(split_axis: usize, split_value: f64, point: &[f64; DIMENSIONS]) -> f64 {

        return (point[split_axis] - split_value).abs();
    }

    ///Returns every record strictly closer than `radius` to `point`.
    ///
    ///The branch not containing `point` is only visited when the splitting plane is within
    ///`radius`.
    pub fn within_radius(&self, point: &[f64; DIMENSIONS], radius: f64) -> Vec<&TreeRecord> {

        let mut hits: Vec<&TreeRecord> = Vec::new();

        //direction is the one we go if we pass
        let mut nodes_to_check: VecDeque<(PagePointer, NodeAction, Option<Direction>)> = VecDeque::new();
        nodes_to_check.push_front((self.root.clone(), NodeAction::Descend, None));

        while let Some((curr_pointer, action, direction)) = nodes_to_check.pop_front() {

            match (action, curr_pointer) {

                (NodeAction::Descend, PagePointer::Leaf(index)) => {
                    for record in self.pages[index].records.iter() {
                        if record.distance(point) < radius {
                            hits.push(record);
                        }
                    }
                },

                (NodeAction::Descend, PagePointer::Node(index)) => {

                    let node = &self.nodes[index];

                    let (descend_pointer, ignored) = match point[node.split_axis] <= node.split_value {
                        true => (node.left_child_pointer.clone(), Direction::Right),
                        false => (node.right_child_pointer.clone(), Direction::Left),
                    };

                    nodes_to_check.push_front((descend_pointer, NodeAction::Descend, None));
                    nodes_to_check.push_back((PagePointer::Node(index), NodeAction::CheckIgnoredBranch, Some(ignored)));
                },

                (NodeAction::CheckIgnoredBranch, PagePointer::Node(index)) => {

                    let node = &self.nodes[index];
                    let dist = Self::dist_to_axis(node.split_axis, node.split_value, point);

                    if dist < radius {
                        let descend_pointer = match direction {
                            Some(Direction::Left) => node.left_child_pointer.clone(),
                            Some(Direction::Right) | None => node.right_child_pointer.clone(),
                        };
                        nodes_to_check.push_front((descend_pointer, NodeAction::Descend, None));
                    }
                },

                //ignored branches are only ever queued for internal nodes
                (NodeAction::CheckIgnoredBranch, PagePointer::Leaf(_)) => {},
            }
        }

        return hits;
    }
}

/// Median of the records along `axis`, moved down when needed so both halves are non-empty.
/// `None` when every record has the same value on this axis.
fn median_split(records: &[TreeRecord], axis: usize) -> Option<f64> {

    let mut values: Vec<f64> = records.iter().map(|x| x.point[axis]).collect();

    //because f64 doesn't like being compared
    values.sort_by(|a, b| a.total_cmp(b));

    let (first, last) = match (values.first(), values.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return None,
    };

    if first == last {
        return None;
    }

    let median = match values.len() % 2 {
        0 => {
            let idx_b: usize = values.len() / 2;
            let idx_a = idx_b - 1;
            (values[idx_a] + values[idx_b]) / 2.0
        },
        _ => values[values.len() / 2],
    };

    if median < last {
        return Some(median);
    }

    //everything above the median equals the maximum, split just below it instead
    return values.iter().rev().find(|v| **v < last).copied();
}
