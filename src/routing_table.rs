use std::collections::HashMap;
use std::fmt;

/// Finite sentinel standing in for an infinite path cost. Any path whose
/// total cost reaches this value is no better than "no route"; topologies
/// are expected to keep real path costs well below it.
pub const UNREACHABLE: u32 = 100;

/// Convention-based router detection: node names beginning with `R` or `r`
/// are routers, everything else is a host.
pub fn is_router_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.eq_ignore_ascii_case(&'r'))
}

/// Distance-vector routing state for one router.
///
/// Holds the owner's own best-cost row plus one row per neighboring router
/// recording the last cost vector that neighbor advertised. `dests` is the
/// set of destinations the table has ever observed, kept in insertion order
/// so the rendered table has stable columns.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    owner: String,
    dests: Vec<String>,
    rows: HashMap<String, HashMap<String, u32>>,
    row_order: Vec<String>,
}

impl RoutingTable {
    pub fn new(owner: impl Into<String>) -> Self {
        let owner = owner.into();
        let mut rows = HashMap::new();
        rows.insert(owner.clone(), HashMap::from([(owner.clone(), 0)]));
        Self {
            dests: vec![owner.clone()],
            row_order: vec![owner.clone()],
            owner,
            rows,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Known destinations in the order they were first observed.
    pub fn dests(&self) -> &[String] {
        &self.dests
    }

    /// The owner's current best-known cost to `dest`.
    pub fn cost_to(&self, dest: &str) -> Option<u32> {
        self.rows.get(&self.owner)?.get(dest).copied()
    }

    /// The owner's own cost vector; this is what gets advertised.
    pub fn own_row(&self) -> HashMap<String, u32> {
        self.rows.get(&self.owner).cloned().unwrap_or_default()
    }

    pub fn row(&self, router: &str) -> Option<&HashMap<String, u32>> {
        self.rows.get(router)
    }

    /// Every router this table keeps a row for, excluding the owner.
    pub fn routers(&self) -> impl Iterator<Item = &str> {
        self.row_order
            .iter()
            .filter(move |r| **r != self.owner)
            .map(String::as_str)
    }

    /// Seed a direct neighbor: every existing row gains a column for it
    /// (link cost in the owner's row, UNREACHABLE elsewhere), and a
    /// neighbor that is itself a router gains a row of UNREACHABLE over
    /// the currently-known destinations.
    pub fn add_neighbor(&mut self, neighbor: &str, cost: u32) {
        if !self.dests.iter().any(|d| d == neighbor) {
            self.dests.push(neighbor.to_string());
        }
        for (router, row) in self.rows.iter_mut() {
            let entry = if *router == self.owner { cost } else { UNREACHABLE };
            row.insert(neighbor.to_string(), entry);
        }
        if is_router_name(neighbor) {
            let row = self
                .dests
                .iter()
                .map(|d| (d.clone(), UNREACHABLE))
                .collect();
            self.rows.insert(neighbor.to_string(), row);
            self.row_order.push(neighbor.to_string());
        }
    }

    /// Record a first sighting of `dest`: every row gets an UNREACHABLE
    /// column for it until an advertisement or relaxation says otherwise.
    fn observe_dest(&mut self, dest: &str) {
        if self.dests.iter().any(|d| d == dest) {
            return;
        }
        self.dests.push(dest.to_string());
        for row in self.rows.values_mut() {
            row.insert(dest.to_string(), UNREACHABLE);
        }
    }

    fn ensure_row(&mut self, router: &str) {
        if !self.rows.contains_key(router) {
            let row = self
                .dests
                .iter()
                .map(|d| (d.clone(), UNREACHABLE))
                .collect();
            self.rows.insert(router.to_string(), row);
            self.row_order.push(router.to_string());
        }
    }

    /// Import an advertised cost vector into the advertiser's row, adding
    /// columns for any destination seen for the first time.
    pub fn import(&mut self, advertiser: &str, vect: &HashMap<String, u32>) {
        self.ensure_row(advertiser);
        for (dest, &cost) in vect {
            self.observe_dest(dest);
            if let Some(row) = self.rows.get_mut(advertiser) {
                row.insert(dest.clone(), cost);
            }
        }
    }

    /// One Bellman-Ford relaxation step against `advertiser`'s vector:
    /// lower the owner's cost to every destination reachable more cheaply
    /// through the advertiser. Returns whether anything improved.
    ///
    /// The owner's own entry and the direct link to the advertiser are
    /// never relaxed.
    pub fn relax(&mut self, advertiser: &str, vect: &HashMap<String, u32>) -> bool {
        let cost_to_adv = self
            .rows
            .get(&self.owner)
            .and_then(|row| row.get(advertiser))
            .copied()
            .unwrap_or(UNREACHABLE);

        let owner = self.owner.clone();
        let Some(own) = self.rows.get_mut(&owner) else {
            return false;
        };

        let mut updated = false;
        for dest in &self.dests {
            if *dest == owner || dest == advertiser {
                continue;
            }
            let Some(&via) = vect.get(dest) else {
                continue;
            };
            let current = own.get(dest).copied().unwrap_or(UNREACHABLE);
            if cost_to_adv + via < current {
                own.insert(dest.clone(), cost_to_adv + via);
                updated = true;
            }
        }
        updated
    }
}

impl fmt::Display for RoutingTable {
    /// Two-dimensional table: header of destinations in insertion order,
    /// one row per known router, every cell `   {:<3}  |`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut header = format!("   {:<3}  |", self.owner);
        for dest in &self.dests {
            header.push_str(&format!("   {dest:<3}  |"));
        }
        let rule = "-".repeat(header.len());

        writeln!(f, "{rule}")?;
        writeln!(f, "{header}")?;
        writeln!(f, "{rule}")?;
        for router in &self.row_order {
            let Some(row) = self.rows.get(router) else {
                continue;
            };
            write!(f, "   {router:<3}  |")?;
            for dest in &self.dests {
                let cost = row.get(dest).copied().unwrap_or(UNREACHABLE);
                write!(f, "   {cost:<3}  |")?;
            }
            writeln!(f)?;
            writeln!(f, "{rule}")?;
        }
        Ok(())
    }
}
