//! SMILES string parser.
//!
//! Parsing is strict in the way a cheminformatics toolkit is strict: a string
//! that is syntactically fine but chemically impossible (pentavalent carbon,
//! an aromatic ring that cannot be kekulized) is rejected.

use std::collections::BTreeMap;

use tracing::trace;

use crate::element::{self, charged_valences};
use crate::error::SmilesError;
use crate::molecule::{Atom, Bond, BondOrder, Molecule};

type Result<T> = std::result::Result<T, SmilesError>;

/// Upper bound on backtracking steps per aromatic system while kekulizing.
const KEKULIZE_BUDGET: usize = 100_000;

/// Largest molecule accepted, counting every written atom.
pub const MAX_ATOMS: usize = 1000;

/// Parse a SMILES string into a `Molecule`.
///
/// Only the text up to the first whitespace character is parsed; anything
/// after it is a title and is ignored.
pub fn parse_smiles(input: &str) -> Result<Molecule> {
    let smiles = input.split(char::is_whitespace).next().unwrap_or_default();
    if smiles.is_empty() {
        return Err(SmilesError::Empty);
    }

    let mut parser = SmilesParser::new(smiles);
    parser.parse()?;
    parser.finish()?;

    let mut mol = Molecule::new(parser.atoms, parser.bonds);
    demote_chain_aromatic_bonds(&mut mol)?;
    let needs_pi = assign_hydrogens(&mut mol)?;
    check_kekulizable(&mol, &needs_pi)?;
    trace!(smiles, atoms = mol.atom_count(), bonds = mol.bond_count(), "parsed SMILES");
    Ok(mol)
}

struct SmilesParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    /// ring number -> (opening atom, bond order written at the opening)
    ring_closures: BTreeMap<u16, (usize, Option<BondOrder>)>,
    branches: Vec<usize>,
    prev_atom: Option<usize>,
    pending_bond: Option<BondOrder>,
}

impl<'a> SmilesParser<'a> {
    fn new(input: &'a str) -> Self {
        SmilesParser {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            ring_closures: BTreeMap::new(),
            branches: Vec::new(),
            prev_atom: None,
            pending_bond: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn unexpected(&self, ch: u8) -> SmilesError {
        SmilesError::UnexpectedChar { ch: ch as char, pos: self.pos }
    }

    fn set_pending_bond(&mut self, order: BondOrder) -> Result<()> {
        if self.prev_atom.is_none() || self.pending_bond.is_some() {
            return Err(SmilesError::DanglingBond(self.pos));
        }
        self.advance();
        self.pending_bond = Some(order);
        Ok(())
    }

    fn parse(&mut self) -> Result<()> {
        while let Some(ch) = self.peek() {
            match ch {
                b'(' => {
                    let prev = self.prev_atom.ok_or(SmilesError::DanglingBond(self.pos))?;
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond(self.pos));
                    }
                    self.advance();
                    self.branches.push(prev);
                }
                b')' => {
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond(self.pos));
                    }
                    self.advance();
                    self.prev_atom = Some(self.branches.pop().ok_or(SmilesError::UnbalancedBranch)?);
                }
                b'-' | b'/' | b'\\' => self.set_pending_bond(BondOrder::Single)?,
                b'=' => self.set_pending_bond(BondOrder::Double)?,
                b'#' => self.set_pending_bond(BondOrder::Triple)?,
                b':' => self.set_pending_bond(BondOrder::Aromatic)?,
                b'%' => {
                    self.advance();
                    let ring_num = self.parse_two_digit_ring()?;
                    self.handle_ring_closure(ring_num)?;
                }
                b'0'..=b'9' => {
                    self.advance();
                    self.handle_ring_closure((ch - b'0') as u16)?;
                }
                b'[' => self.parse_bracket_atom()?,
                b'.' => {
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond(self.pos));
                    }
                    self.advance();
                    self.prev_atom = None;
                }
                _ if is_organic_atom_start(ch) => self.parse_organic_atom()?,
                _ => return Err(self.unexpected(ch)),
            }
        }
        Ok(())
    }

    fn finish(&self) -> Result<()> {
        if self.pending_bond.is_some() {
            return Err(SmilesError::DanglingBond(self.pos));
        }
        if !self.branches.is_empty() {
            return Err(SmilesError::UnbalancedBranch);
        }
        if !self.ring_closures.is_empty() {
            return Err(SmilesError::UnclosedRing(self.ring_closures.keys().copied().collect()));
        }
        Ok(())
    }

    fn parse_organic_atom(&mut self) -> Result<()> {
        let start = self.pos;
        let ch = self.advance().ok_or(SmilesError::Empty)?;
        let (symbol, is_aromatic) = match ch {
            b'B' if self.peek() == Some(b'r') => {
                self.advance();
                ("Br", false)
            }
            b'C' if self.peek() == Some(b'l') => {
                self.advance();
                ("Cl", false)
            }
            b'*' => ("*", false),
            b'B' => ("B", false),
            b'C' => ("C", false),
            b'N' => ("N", false),
            b'O' => ("O", false),
            b'P' => ("P", false),
            b'S' => ("S", false),
            b'F' => ("F", false),
            b'I' => ("I", false),
            b'b' => ("B", true),
            b'c' => ("C", true),
            b'n' => ("N", true),
            b'o' => ("O", true),
            b'p' => ("P", true),
            b's' => ("S", true),
            other => {
                self.pos = start;
                return Err(self.unexpected(other));
            }
        };
        let atomic_number = element::atomic_number(symbol)
            .ok_or_else(|| SmilesError::UnknownElement(symbol.to_string()))?;

        self.push_atom(Atom {
            atomic_number,
            formal_charge: 0,
            isotope: None,
            is_aromatic,
            hydrogens: 0,
            bracket: false,
        })
    }

    fn parse_bracket_atom(&mut self) -> Result<()> {
        self.advance(); // '['

        let isotope = self.parse_number().map(|n| n.min(u16::MAX as u32) as u16);
        let (atomic_number, is_aromatic) = self.parse_bracket_symbol()?;

        // Tetrahedral chirality only; the parity does not affect the 2D graph.
        while self.peek() == Some(b'@') {
            self.advance();
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.advance();
            hydrogens = self.parse_number().map_or(1, |n| n.min(u8::MAX as u32) as u8);
        }

        let formal_charge = self.parse_charge();

        // Atom class, e.g. [CH3:1]
        if self.peek() == Some(b':') {
            self.advance();
            if self.parse_number().is_none() {
                return match self.peek() {
                    Some(ch) => Err(self.unexpected(ch)),
                    None => Err(SmilesError::UnterminatedBracket),
                };
            }
        }

        match self.advance() {
            Some(b']') => {}
            Some(ch) => {
                self.pos -= 1;
                return Err(self.unexpected(ch));
            }
            None => return Err(SmilesError::UnterminatedBracket),
        }

        self.push_atom(Atom {
            atomic_number,
            formal_charge,
            isotope,
            is_aromatic,
            hydrogens,
            bracket: true,
        })
    }

    fn parse_bracket_symbol(&mut self) -> Result<(u8, bool)> {
        let first = self.advance().ok_or(SmilesError::UnterminatedBracket)?;
        if first == b'*' {
            return Ok((0, false));
        }

        if first.is_ascii_lowercase() {
            // Two-letter aromatic symbols first: se, as
            if let Some(second) = self.peek() {
                let pair = [first.to_ascii_uppercase(), second];
                if let Ok(two) = std::str::from_utf8(&pair) {
                    if matches!(two, "Se" | "As") {
                        self.advance();
                        return Ok((element::atomic_number(two).unwrap_or_default(), true));
                    }
                }
            }
            let upper = (first.to_ascii_uppercase() as char).to_string();
            let z = element::atomic_number(&upper)
                .ok_or_else(|| SmilesError::UnknownElement((first as char).to_string()))?;
            if !element::can_be_aromatic(z) {
                return Err(SmilesError::InvalidAromatic(upper));
            }
            return Ok((z, true));
        }

        if !first.is_ascii_uppercase() {
            self.pos -= 1;
            return Err(self.unexpected(first));
        }

        if let Some(second) = self.peek().filter(u8::is_ascii_lowercase) {
            let two = format!("{}{}", first as char, second as char);
            if let Some(z) = element::atomic_number(&two) {
                self.advance();
                return Ok((z, false));
            }
        }
        let one = (first as char).to_string();
        element::atomic_number(&one)
            .map(|z| (z, false))
            .ok_or(SmilesError::UnknownElement(one))
    }

    fn parse_charge(&mut self) -> i8 {
        let sign: i8 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return 0,
        };
        let symbol = self.advance().unwrap_or_default();
        if let Some(n) = self.parse_number() {
            return sign * n.min(15) as i8;
        }
        let mut count = 1i8;
        while self.peek() == Some(symbol) && count < 15 {
            self.advance();
            count += 1;
        }
        sign * count
    }

    fn parse_number(&mut self) -> Option<u32> {
        let mut n: u32 = 0;
        let mut found = false;
        while let Some(ch) = self.peek().filter(u8::is_ascii_digit) {
            self.advance();
            n = n.saturating_mul(10).saturating_add((ch - b'0') as u32);
            found = true;
        }
        found.then_some(n)
    }

    fn parse_two_digit_ring(&mut self) -> Result<u16> {
        let mut digits = [0u8; 2];
        for slot in &mut digits {
            match self.advance() {
                Some(d) if d.is_ascii_digit() => *slot = d - b'0',
                Some(other) => {
                    self.pos -= 1;
                    return Err(self.unexpected(other));
                }
                None => return Err(SmilesError::DanglingBond(self.pos)),
            }
        }
        Ok(digits[0] as u16 * 10 + digits[1] as u16)
    }

    fn handle_ring_closure(&mut self, ring_num: u16) -> Result<()> {
        let current = self.prev_atom.ok_or(SmilesError::DanglingBond(self.pos))?;

        let Some((open_atom, open_bond)) = self.ring_closures.remove(&ring_num) else {
            self.ring_closures.insert(ring_num, (current, self.pending_bond.take()));
            return Ok(());
        };

        let duplicate = self.bonds.iter().any(|b| {
            (b.atom1 == open_atom && b.atom2 == current) || (b.atom1 == current && b.atom2 == open_atom)
        });
        if open_atom == current || duplicate {
            return Err(SmilesError::InvalidRingClosure(ring_num));
        }

        let order = match (open_bond, self.pending_bond.take()) {
            (Some(a), Some(b)) if a != b => return Err(SmilesError::InvalidRingClosure(ring_num)),
            (Some(a), _) | (None, Some(a)) => a,
            (None, None) => self.default_order(open_atom, current),
        };
        self.bonds.push(Bond { atom1: open_atom, atom2: current, order });
        Ok(())
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.atoms[a].is_aromatic && self.atoms[b].is_aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn push_atom(&mut self, atom: Atom) -> Result<()> {
        let idx = self.atoms.len();
        if idx >= MAX_ATOMS {
            return Err(SmilesError::TooManyAtoms { limit: MAX_ATOMS });
        }
        self.atoms.push(atom);
        if let Some(prev) = self.prev_atom {
            let order = self
                .pending_bond
                .take()
                .unwrap_or_else(|| self.default_order(prev, idx));
            self.bonds.push(Bond { atom1: prev, atom2: idx, order });
        }
        self.prev_atom = Some(idx);
        Ok(())
    }
}

fn is_organic_atom_start(ch: u8) -> bool {
    matches!(
        ch,
        b'*' | b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I'
            | b'b' | b'c' | b'n' | b'o' | b'p' | b's'
    )
}

/// Aromatic bonds outside rings (biphenyl's linker written implicitly) are
/// single bonds; aromatic atoms outside rings are an error.
fn demote_chain_aromatic_bonds(mol: &mut Molecule) -> Result<()> {
    for bi in 0..mol.bonds.len() {
        if mol.bonds[bi].order == BondOrder::Aromatic && !mol.is_ring_bond(bi) {
            mol.bonds[bi].order = BondOrder::Single;
        }
    }
    match (0..mol.atom_count())
        .find(|&i| mol.atoms[i].is_aromatic && mol.atoms[i].atomic_number != 0 && !mol.is_ring_atom(i))
    {
        Some(atom) => Err(SmilesError::AromaticOutsideRing(atom)),
        None => Ok(()),
    }
}

/// Fill implicit hydrogens, check valences, and report which aromatic atoms
/// must take a double bond in a Kekulé structure.
fn assign_hydrogens(mol: &mut Molecule) -> Result<Vec<bool>> {
    let mut needs_pi = vec![false; mol.atom_count()];

    for i in 0..mol.atom_count() {
        let atom = &mol.atoms[i];
        let sigma: u32 = mol.adjacency[i]
            .iter()
            .map(|&(_, bi)| mol.bonds[bi].order.localized() as u32)
            .sum();
        let has_multiple = mol.adjacency[i]
            .iter()
            .any(|&(_, bi)| matches!(mol.bonds[bi].order, BondOrder::Double | BondOrder::Triple));
        let valences = charged_valences(atom.atomic_number, atom.formal_charge);

        let mut hydrogens = atom.hydrogens as u32;
        let mut pi = 0u32;

        if atom.is_aromatic && atom.atomic_number != 0 {
            let default = valences.map(|v| v[0] as u32);
            if atom.bracket {
                if !has_multiple && default.is_some_and(|d| d >= sigma + hydrogens + 1) {
                    pi = 1;
                }
            } else if !has_multiple && default.is_some_and(|d| d > sigma) {
                pi = 1;
                hydrogens = default.unwrap_or_default() - sigma - 1;
            } else if let Some(vals) = valences {
                hydrogens = smallest_fit(vals, sigma)
                    .map(|v| v - sigma)
                    .ok_or(SmilesError::Valence { atom: i, valence: sigma })?;
            }
        } else if !atom.bracket {
            if let Some(vals) = valences {
                hydrogens = smallest_fit(vals, sigma)
                    .map(|v| v - sigma)
                    .ok_or(SmilesError::Valence { atom: i, valence: sigma })?;
            }
        }

        let total = sigma + hydrogens + pi;
        if let Some(max) = valences.and_then(|v| v.iter().max()) {
            if total > *max as u32 {
                return Err(SmilesError::Valence { atom: i, valence: total });
            }
        }

        mol.atoms[i].hydrogens = hydrogens.min(u8::MAX as u32) as u8;
        needs_pi[i] = pi == 1;
    }
    Ok(needs_pi)
}

fn smallest_fit(valences: &[u8], used: u32) -> Option<u32> {
    valences.iter().map(|&v| v as u32).filter(|&v| v >= used).min()
}

/// Every atom that needs a pi bond must be paired with exactly one aromatic
/// neighbour that also needs one.
fn check_kekulizable(mol: &Molecule, needs_pi: &[bool]) -> Result<()> {
    let partners: Vec<Vec<usize>> = (0..mol.atom_count())
        .map(|i| {
            if !needs_pi[i] {
                return Vec::new();
            }
            mol.adjacency[i]
                .iter()
                .filter(|&&(n, bi)| needs_pi[n] && mol.bonds[bi].order == BondOrder::Aromatic)
                .map(|&(n, _)| n)
                .collect()
        })
        .collect();

    let mut visited = vec![false; mol.atom_count()];
    for start in 0..mol.atom_count() {
        if !needs_pi[start] || visited[start] {
            continue;
        }
        let mut system = vec![start];
        visited[start] = true;
        let mut cursor = 0;
        while cursor < system.len() {
            let atom = system[cursor];
            cursor += 1;
            for &n in &partners[atom] {
                if !visited[n] {
                    visited[n] = true;
                    system.push(n);
                }
            }
        }

        if system.len() % 2 == 1 {
            return Err(SmilesError::Kekulize(start));
        }
        let mut matched = vec![false; mol.atom_count()];
        let mut budget = KEKULIZE_BUDGET;
        if !perfect_matching(&system, &partners, &mut matched, &mut budget) {
            return Err(SmilesError::Kekulize(start));
        }
    }
    Ok(())
}

/// Backtracking search for a perfect matching of `system` over `partners`.
///
/// Always pairs the unmatched atom with the fewest free partners next. The
/// search keeps its own stack of choices, one frame per paired atom.
fn perfect_matching(
    system: &[usize],
    partners: &[Vec<usize>],
    matched: &mut [bool],
    budget: &mut usize,
) -> bool {
    struct Choice {
        atom: usize,
        next: usize,
        partner: Option<usize>,
    }
    let mut stack: Vec<Choice> = Vec::new();

    loop {
        if *budget == 0 {
            return false;
        }
        *budget -= 1;

        match most_constrained(system, partners, matched) {
            Pick::Done => return true,
            Pick::Atom(atom) => {
                matched[atom] = true;
                stack.push(Choice { atom, next: 0, partner: None });
            }
            Pick::DeadEnd => {}
        }

        // Give the top choice its next free partner, unwinding exhausted ones.
        loop {
            let Some(choice) = stack.last_mut() else {
                return false;
            };
            if let Some(p) = choice.partner.take() {
                matched[p] = false;
            }
            let candidates = &partners[choice.atom];
            while choice.next < candidates.len() && matched[candidates[choice.next]] {
                choice.next += 1;
            }
            if let Some(&p) = candidates.get(choice.next) {
                choice.next += 1;
                matched[p] = true;
                choice.partner = Some(p);
                break;
            }
            matched[choice.atom] = false;
            stack.pop();
        }
    }
}

enum Pick {
    Done,
    DeadEnd,
    Atom(usize),
}

fn most_constrained(system: &[usize], partners: &[Vec<usize>], matched: &[bool]) -> Pick {
    let mut best: Option<(usize, usize)> = None;
    for &atom in system {
        if matched[atom] {
            continue;
        }
        let free = partners[atom].iter().filter(|&&n| !matched[n]).count();
        if free == 0 {
            return Pick::DeadEnd;
        }
        if best.map_or(true, |(_, f)| free < f) {
            best = Some((atom, free));
        }
    }
    match best {
        Some((atom, _)) => Pick::Atom(atom),
        None => Pick::Done,
    }
}
