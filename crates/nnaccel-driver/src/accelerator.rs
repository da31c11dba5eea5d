// SPDX-License-Identifier: AGPL-3.0-only

//! Simulated accelerator
//!
//! [`Accelerator`] owns the 256-unit pool, the prepared-matrix cache and the
//! quantizer. Every method takes `&self`; units are locked individually, so
//! one accelerator can be shared across threads and operations on disjoint
//! unit pairs proceed in parallel.
//!
//! ## Unit operations
//!
//! | Op | Effect |
//! |----|--------|
//! | `copy` | `target ← source` |
//! | `add` / `sub` / `mul` | `target ← target ∘ source` |
//! | `relu` / `tanh` / `sigmoid` | `target ← f(source)` |
//!
//! Each call validates ids, populated units and lengths before it writes,
//! so a failed call leaves every unit untouched.
//!
//! A unit holds data from at most one vector. Binding a second vector to a
//! unit, or clearing it, leaves the first vector's binding stale: the
//! binding-based forms (`sync_vector`, `activate`, `execute_vectors`) then
//! fail with `NotBound` instead of reading someone else's data.

use crate::block::BlockPartition;
use crate::buffer::{ensure_same_len, LaneBuffer};
use crate::cache::{MatrixCache, PreparedMatrix};
use crate::config::AcceleratorConfig;
use crate::error::{AccelError, Result};
use crate::matrix::Matrix;
use crate::ops::{Activation, UnitOp, VectorOp};
use crate::quantize::{ConversionKind, Quantizer};
use crate::stats::{OpClass, OpCounters, OperationStats};
use crate::store::MatrixStore;
use crate::unit::{UnitGuards, UnitId, UnitPool};
use crate::vector::Vector;
use nnaccel_chip::units::UNIT_COUNT;
use std::time::Instant;
use tracing::{debug, info};

/// Point-in-time view of accelerator state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceleratorStatus {
    /// Units holding data, ascending
    pub populated_units: Vec<UnitId>,
    /// Live prepared matrices
    pub prepared_matrices: usize,
    /// Completed-operation counters
    pub stats: OperationStats,
}

impl AcceleratorStatus {
    /// Number of populated units
    pub fn populated_count(&self) -> usize {
        self.populated_units.len()
    }

    /// Number of idle units
    pub fn idle_count(&self) -> usize {
        UNIT_COUNT - self.populated_units.len()
    }
}

/// The simulated accelerator
#[derive(Debug)]
pub struct Accelerator {
    config: AcceleratorConfig,
    units: UnitPool,
    cache: MatrixCache,
    quantizer: Quantizer,
    counters: OpCounters,
}

impl Default for Accelerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accelerator {
    /// Accelerator with default configuration
    pub fn new() -> Self {
        let config = AcceleratorConfig::default();
        info!("Accelerator ready: {UNIT_COUNT} units");
        Self {
            quantizer: Quantizer::default(),
            config,
            units: UnitPool::new(),
            cache: MatrixCache::new(),
            counters: OpCounters::default(),
        }
    }

    /// Accelerator with a custom configuration
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn with_config(config: AcceleratorConfig) -> Result<Self> {
        config.validate()?;
        let quantizer = Quantizer::new(config.ternary_threshold)?;
        info!(
            "Accelerator ready: {UNIT_COUNT} units, ternary threshold {}",
            config.ternary_threshold
        );
        Ok(Self {
            config,
            units: UnitPool::new(),
            cache: MatrixCache::new(),
            quantizer,
            counters: OpCounters::default(),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &AcceleratorConfig {
        &self.config
    }

    /// Quantizer used by `convert_*`
    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    /// Prepared-matrix cache
    pub fn cache(&self) -> &MatrixCache {
        &self.cache
    }

    // ── Unit-bound operations ───────────────────────────────────────────────

    /// Copy `vector` into unit `unit` and record the binding on the vector
    ///
    /// Any vector previously bound to `unit` loses its binding.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnitId` if `unit >= 256`; the vector keeps its old
    /// binding in that case.
    pub fn bind_to_unit(&self, vector: &mut Vector, unit: usize) -> Result<UnitId> {
        let start = Instant::now();
        let id = UnitId::new(unit)?;
        let generation = self.units.lock(id).bind(vector.buffer().clone());
        vector.set_binding(id, generation);
        self.counters.record(OpClass::Bind, start);
        debug!("Bound {} elements to {id} (generation {generation})", vector.len());
        Ok(id)
    }

    /// Unit `vector` is bound to, provided no later bind or clear took it over
    fn owned_unit(&self, vector: &Vector) -> Result<UnitId> {
        let unit = vector.require_binding()?;
        let current = self.units.lock(unit).generation();
        check_generation(vector, unit, current)?;
        Ok(unit)
    }

    /// Run `op` from unit `source` into unit `target`
    ///
    /// # Errors
    ///
    /// - `InvalidUnitId` if either id is out of range
    /// - `UnboundUnit` if the source is empty, or the target is empty for
    ///   `add`/`sub`/`mul`
    /// - `InvalidShape` if a populated target's length differs from the
    ///   source's (activations overwrite the target and skip this check)
    pub fn execute(&self, op: UnitOp, source: usize, target: usize) -> Result<()> {
        let start = Instant::now();
        let source = UnitId::new(source)?;
        let target = UnitId::new(target)?;

        match self.units.lock_pair(source, target) {
            UnitGuards::Same(mut unit) => {
                let current = unit.contents()?;
                let result = evaluate(op, current, Some(current))?;
                unit.store(result);
            }
            UnitGuards::Pair {
                source: src,
                target: mut tgt,
            } => {
                let input = src.contents()?;
                let existing = if op.reads_target() {
                    Some(tgt.contents()?)
                } else {
                    tgt.contents().ok()
                };
                let result = evaluate(op, input, existing)?;
                tgt.store(result);
            }
        }

        self.counters.record(OpClass::Execute, start);
        debug!("execute {op}: {source} -> {target}");
        Ok(())
    }

    /// [`execute`](Self::execute) with a string tag
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for an unknown tag, otherwise as
    /// [`execute`](Self::execute).
    pub fn execute_named(&self, op: &str, source: usize, target: usize) -> Result<()> {
        self.execute(op.parse()?, source, target)
    }

    /// Run `op` between the units two vectors are bound to, then refresh
    /// `target` from its unit
    ///
    /// # Errors
    ///
    /// Returns `NotBound` if either vector is unbound or its binding is
    /// stale, otherwise as [`execute`](Self::execute).
    pub fn execute_vectors(&self, op: UnitOp, source: &Vector, target: &mut Vector) -> Result<()> {
        let src = self.owned_unit(source)?;
        let tgt = self.owned_unit(target)?;
        self.execute(op, src.index(), tgt.index())?;
        self.sync_vector(target)
    }

    /// Apply `activation` in place on the unit `vector` is bound to, and
    /// refresh the vector
    ///
    /// # Errors
    ///
    /// Returns `NotBound` if the vector is unbound, or if its unit has since
    /// been rebound or cleared.
    pub fn activate(&self, vector: &mut Vector, activation: Activation) -> Result<()> {
        let unit = self.owned_unit(vector)?.index();
        self.execute(UnitOp::Activate(activation), unit, unit)?;
        self.sync_vector(vector)
    }

    /// Overwrite `vector` with the contents of its bound unit
    ///
    /// # Errors
    ///
    /// Returns `NotBound` if the vector is unbound, or if its unit has since
    /// been rebound or cleared.
    pub fn sync_vector(&self, vector: &mut Vector) -> Result<()> {
        let unit = vector.require_binding()?;
        let contents = {
            let guard = self.units.lock(unit);
            check_generation(vector, unit, guard.generation())?;
            guard.contents()?.clone()
        };
        vector.replace_buffer(contents);
        Ok(())
    }

    /// Copy of unit `unit`'s storage
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnitId` or `UnboundUnit`.
    pub fn read_unit(&self, unit: usize) -> Result<LaneBuffer> {
        let id = UnitId::new(unit)?;
        let contents = self.units.lock(id).contents()?.clone();
        Ok(contents)
    }

    /// Return unit `unit` to idle; true if it held data
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnitId` if `unit >= 256`.
    pub fn clear_unit(&self, unit: usize) -> Result<bool> {
        let id = UnitId::new(unit)?;
        let mut guard = self.units.lock(id);
        let was_populated = !guard.is_idle();
        guard.clear();
        if was_populated {
            debug!("Cleared {id}");
        }
        Ok(was_populated)
    }

    /// True if unit `unit` holds data
    ///
    /// # Errors
    ///
    /// Returns `InvalidUnitId` if `unit >= 256`.
    pub fn is_unit_populated(&self, unit: usize) -> Result<bool> {
        let id = UnitId::new(unit)?;
        Ok(!self.units.lock(id).is_idle())
    }

    // ── Direct vector operations ────────────────────────────────────────────

    /// Apply `op` to a copy of `vector`; no binding needed, input untouched
    pub fn compute_vector(&self, vector: &Vector, op: VectorOp) -> Vector {
        let start = Instant::now();
        let out = Vector::from_buffer(vector.buffer().map(|x| op.apply(x)));
        self.counters.record(OpClass::VectorOp, start);
        debug!("vector {op} over {} elements", vector.len());
        out
    }

    /// [`compute_vector`](Self::compute_vector) with a string tag
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for an unknown tag.
    pub fn compute_vector_named(&self, vector: &Vector, op: &str) -> Result<Vector> {
        Ok(self.compute_vector(vector, op.parse()?))
    }

    // ── Matrix-vector products ──────────────────────────────────────────────

    /// Partition `matrix` and retain it for repeated products
    pub fn prepare(&self, matrix: &Matrix) -> PreparedMatrix {
        let start = Instant::now();
        let handle = self.cache.prepare(matrix);
        self.counters.record(OpClass::Prepare, start);
        handle
    }

    /// `matrix · vector` against a prepared handle
    ///
    /// # Errors
    ///
    /// Returns `NotBound` for an unknown or released handle, or one issued by
    /// another accelerator, and `InvalidShape` if `vector.len() != cols`.
    pub fn compute_with_prepared(&self, handle: PreparedMatrix, vector: &Vector) -> Result<Vec<f32>> {
        let start = Instant::now();
        let y = self.cache.compute(handle, vector.as_slice())?;
        self.counters.record(OpClass::Product, start);
        Ok(y)
    }

    /// One-shot `matrix · vector`; nothing is retained
    ///
    /// # Errors
    ///
    /// Returns `InvalidShape` if `vector.len() != matrix.cols()`.
    pub fn compute_matrix_vector_multiply(&self, matrix: &Matrix, vector: &Vector) -> Result<Vec<f32>> {
        if vector.len() != matrix.cols() {
            return Err(AccelError::invalid_shape(format!(
                "vector length {} does not match {} columns",
                vector.len(),
                matrix.cols()
            )));
        }
        let start = Instant::now();
        let y = BlockPartition::new(matrix).multiply(vector.as_slice())?;
        self.counters.record(OpClass::Product, start);
        Ok(y)
    }

    /// Drop a prepared matrix; false if the handle was already gone
    pub fn release(&self, handle: PreparedMatrix) -> bool {
        self.cache.release(handle)
    }

    // ── Conversion ──────────────────────────────────────────────────────────

    /// Converted copy of `vector` (unbound)
    pub fn convert_vector(&self, vector: &Vector, kind: ConversionKind) -> Vector {
        let start = Instant::now();
        let out = self.quantizer.convert_vector(vector, kind);
        self.counters.record(OpClass::Conversion, start);
        debug!("convert {} elements to {kind}", vector.len());
        out
    }

    /// Element-wise converted copy of `matrix`
    pub fn convert_matrix(&self, matrix: &Matrix, kind: ConversionKind) -> Matrix {
        let start = Instant::now();
        let out = self.quantizer.convert_matrix(matrix, kind);
        self.counters.record(OpClass::Conversion, start);
        debug!("convert {}×{} matrix to {kind}", matrix.rows(), matrix.cols());
        out
    }

    /// [`convert_vector`](Self::convert_vector) with a string tag
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedConversion` for an unknown tag.
    pub fn convert_named(&self, vector: &Vector, kind: &str) -> Result<Vector> {
        Ok(self.convert_vector(vector, kind.parse()?))
    }

    // ── Persistence ─────────────────────────────────────────────────────────

    /// Matrix store at the configured directory
    ///
    /// # Errors
    ///
    /// Returns `Io` if the directory cannot be created.
    pub fn store(&self) -> Result<MatrixStore> {
        MatrixStore::from_config(&self.config)
    }

    /// Snapshot of populated units, live prepared matrices and counters
    pub fn status(&self) -> AcceleratorStatus {
        AcceleratorStatus {
            populated_units: self.units.populated(),
            prepared_matrices: self.cache.len(),
            stats: self.counters.snapshot(),
        }
    }
}

fn check_generation(vector: &Vector, unit: UnitId, current: u64) -> Result<()> {
    if vector.binding_generation() == Some(current) {
        Ok(())
    } else {
        Err(AccelError::not_bound(format!(
            "{unit} has been rebound or cleared since this vector was bound"
        )))
    }
}

/// Compute the new target contents without touching any unit
fn evaluate(op: UnitOp, source: &LaneBuffer, target: Option<&LaneBuffer>) -> Result<LaneBuffer> {
    match op {
        UnitOp::Activate(a) => Ok(source.map(|x| a.apply(x))),
        UnitOp::Copy => {
            if let Some(existing) = target {
                ensure_same_len(existing.len(), source.len())?;
            }
            Ok(source.clone())
        }
        UnitOp::Add | UnitOp::Sub | UnitOp::Mul => {
            let Some(existing) = target else {
                return Err(AccelError::invalid_shape("binary op without a target"));
            };
            let mut out = existing.clone();
            match op {
                UnitOp::Add => out.zip_apply(source, |t, s| t + s)?,
                UnitOp::Sub => out.zip_apply(source, |t, s| t - s)?,
                _ => out.zip_apply(source, |t, s| t * s)?,
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn ramp(len: usize) -> Vector {
        let values: Vec<f32> = (0..len).map(|i| i as f32 - 8.0).collect();
        Vector::from_slice(&values).unwrap()
    }

    #[test]
    fn bind_copies_and_records() {
        let acc = Accelerator::new();
        let mut v = ramp(16);
        let id = acc.bind_to_unit(&mut v, 4).unwrap();
        assert_eq!(v.binding(), Some(id));
        assert_eq!(acc.read_unit(4).unwrap().as_slice(), v.as_slice());

        // Later edits to the vector stay local until re-bound.
        v.set(0, 99.0).unwrap();
        assert!((acc.read_unit(4).unwrap().as_slice()[0] + 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn bind_out_of_range_keeps_vector_unbound() {
        let acc = Accelerator::new();
        let mut v = ramp(16);
        let err = acc.bind_to_unit(&mut v, 256).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUnitId);
        assert!(!v.is_bound());
        assert!(acc.status().populated_units.is_empty());
    }

    #[test]
    fn copy_into_empty_target() {
        let acc = Accelerator::new();
        let mut v = ramp(32);
        acc.bind_to_unit(&mut v, 0).unwrap();
        acc.execute(UnitOp::Copy, 0, 9).unwrap();
        assert_eq!(acc.read_unit(9).unwrap().as_slice(), v.as_slice());
    }

    #[test]
    fn copy_rejects_length_mismatch() {
        let acc = Accelerator::new();
        acc.bind_to_unit(&mut ramp(16), 0).unwrap();
        acc.bind_to_unit(&mut ramp(32), 1).unwrap();
        let err = acc.execute(UnitOp::Copy, 0, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidShape);
        assert_eq!(acc.read_unit(1).unwrap().len(), 32);
    }

    #[test]
    fn binary_ops_combine_into_target() {
        let acc = Accelerator::new();
        let mut a = Vector::from_slice(&[2.0; 16]).unwrap();
        let mut b = Vector::from_slice(&[3.0; 16]).unwrap();
        acc.bind_to_unit(&mut a, 0).unwrap();
        acc.bind_to_unit(&mut b, 1).unwrap();

        acc.execute(UnitOp::Add, 0, 1).unwrap();
        assert_eq!(acc.read_unit(1).unwrap().as_slice(), &[5.0; 16]);
        acc.execute(UnitOp::Sub, 0, 1).unwrap();
        assert_eq!(acc.read_unit(1).unwrap().as_slice(), &[3.0; 16]);
        acc.execute(UnitOp::Mul, 0, 1).unwrap();
        assert_eq!(acc.read_unit(1).unwrap().as_slice(), &[6.0; 16]);
        // Source untouched.
        assert_eq!(acc.read_unit(0).unwrap().as_slice(), &[2.0; 16]);
    }

    #[test]
    fn add_same_unit_doubles() {
        let acc = Accelerator::new();
        acc.bind_to_unit(&mut Vector::from_slice(&[1.5; 16]).unwrap(), 2).unwrap();
        acc.execute(UnitOp::Add, 2, 2).unwrap();
        assert_eq!(acc.read_unit(2).unwrap().as_slice(), &[3.0; 16]);
    }

    #[test]
    fn activation_writes_f_of_source() {
        let acc = Accelerator::new();
        let mut v = ramp(16);
        acc.bind_to_unit(&mut v, 0).unwrap();
        acc.execute(UnitOp::RELU, 0, 5).unwrap();
        let out = acc.read_unit(5).unwrap();
        assert!(out.as_slice().iter().all(|&x| x >= 0.0));
        assert!((out.as_slice()[15] - 7.0).abs() < f32::EPSILON);
        // Source keeps its negatives.
        assert!((acc.read_unit(0).unwrap().as_slice()[0] + 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn empty_units_are_state_errors() {
        let acc = Accelerator::new();
        let err = acc.execute(UnitOp::Copy, 10, 11).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnboundUnit);
        assert!(err.is_state_error());

        acc.bind_to_unit(&mut ramp(16), 10).unwrap();
        let err = acc.execute(UnitOp::Add, 10, 11).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnboundUnit);
        assert!(!acc.is_unit_populated(11).unwrap());
    }

    #[test]
    fn invalid_ids_rejected_first() {
        let acc = Accelerator::new();
        let err = acc.execute(UnitOp::Copy, 0, 300).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUnitId);
        assert_eq!(acc.read_unit(256).unwrap_err().kind(), ErrorKind::InvalidUnitId);
        assert_eq!(acc.clear_unit(999).unwrap_err().kind(), ErrorKind::InvalidUnitId);
    }

    #[test]
    fn named_ops_parse_at_boundary() {
        let acc = Accelerator::new();
        acc.bind_to_unit(&mut ramp(16), 0).unwrap();
        acc.execute_named("tanh", 0, 1).unwrap();
        let err = acc.execute_named("softmax", 0, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedOperation);
    }

    #[test]
    fn vector_forms_require_binding() {
        let acc = Accelerator::new();
        let mut a = ramp(16);
        let mut b = ramp(16);
        assert_eq!(
            acc.activate(&mut a, Activation::Relu).unwrap_err().kind(),
            ErrorKind::NotBound
        );
        assert_eq!(acc.sync_vector(&mut a).unwrap_err().kind(), ErrorKind::NotBound);

        acc.bind_to_unit(&mut a, 0).unwrap();
        assert_eq!(
            acc.execute_vectors(UnitOp::Add, &a, &mut b).unwrap_err().kind(),
            ErrorKind::NotBound
        );
        acc.bind_to_unit(&mut b, 1).unwrap();
        acc.execute_vectors(UnitOp::Add, &a, &mut b).unwrap();
        assert!((b.as_slice()[0] + 16.0).abs() < f32::EPSILON);

        acc.activate(&mut b, Activation::Relu).unwrap();
        assert!(b.as_slice().iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn compute_vector_is_pure() {
        let acc = Accelerator::new();
        let v = ramp(16);
        let added = acc.compute_vector(&v, VectorOp::Add);
        let doubled = acc.compute_vector(&v, VectorOp::Mul);
        assert!((added.as_slice()[0] + 7.0).abs() < f32::EPSILON);
        assert!((doubled.as_slice()[0] + 16.0).abs() < f32::EPSILON);
        assert!((v.as_slice()[0] + 8.0).abs() < f32::EPSILON);
        assert!(!added.is_bound());
        assert!(acc.compute_vector_named(&v, "cube").is_err());
    }

    #[test]
    fn prepared_matches_one_shot() {
        let acc = Accelerator::new();
        let data: Vec<f32> = (0..40 * 32).map(|i| ((i * 13) % 11) as f32 - 5.0).collect();
        let m = Matrix::from_vec(40, 32, data).unwrap();
        let x = ramp(32);
        let handle = acc.prepare(&m);
        let prepared = acc.compute_with_prepared(handle, &x).unwrap();
        let direct = acc.compute_matrix_vector_multiply(&m, &x).unwrap();
        assert_eq!(prepared.len(), 40);
        assert_eq!(prepared, direct);
        assert_eq!(acc.status().prepared_matrices, 1);

        assert!(acc.release(handle));
        let err = acc.compute_with_prepared(handle, &x).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotBound);
    }

    #[test]
    fn one_shot_checks_columns() {
        let acc = Accelerator::new();
        let m = Matrix::identity(16).unwrap();
        let err = acc.compute_matrix_vector_multiply(&m, &ramp(32)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidShape);
        assert!(acc.cache().is_empty());
    }

    #[test]
    fn conversions() {
        let acc = Accelerator::new();
        let v = Vector::from_slice(&[0.3f32, -0.7, 0.9, -0.2].repeat(4)).unwrap();
        let t = acc.convert_named(&v, "trinary").unwrap();
        assert_eq!(&t.as_slice()[..4], &[0.0, -1.0, 1.0, 0.0]);
        assert_eq!(acc.convert_vector(&v, ConversionKind::Full), v);
        assert_eq!(
            acc.convert_named(&v, "bf16").unwrap_err().kind(),
            ErrorKind::UnsupportedConversion
        );
    }

    #[test]
    fn custom_threshold_reaches_quantizer() {
        let config = AcceleratorConfig::default().with_ternary_threshold(0.25);
        let acc = Accelerator::with_config(config).unwrap();
        let v = Vector::from_slice(&[0.3; 16]).unwrap();
        assert_eq!(acc.convert_vector(&v, ConversionKind::Trinary).as_slice(), &[1.0; 16]);

        let bad = AcceleratorConfig::default().with_ternary_threshold(2.0);
        assert_eq!(
            Accelerator::with_config(bad).unwrap_err().kind(),
            ErrorKind::InvalidConfig
        );
    }

    #[test]
    fn rebinding_a_unit_detaches_the_first_vector() {
        let acc = Accelerator::new();
        let mut a = Vector::from_slice(&[1.0; 16]).unwrap();
        let mut b = Vector::from_slice(&[-5.0; 16]).unwrap();
        acc.bind_to_unit(&mut a, 3).unwrap();
        acc.bind_to_unit(&mut b, 3).unwrap();

        let err = acc.activate(&mut a, Activation::Tanh).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotBound);
        assert_eq!(acc.sync_vector(&mut a).unwrap_err().kind(), ErrorKind::NotBound);
        assert_eq!(a.as_slice(), &[1.0; 16]);
        // The unit still holds b, untouched by the failed activate.
        assert_eq!(acc.read_unit(3).unwrap().as_slice(), &[-5.0; 16]);

        acc.activate(&mut b, Activation::Relu).unwrap();
        assert_eq!(b.as_slice(), &[0.0; 16]);

        // Re-binding a takes the unit back.
        acc.bind_to_unit(&mut a, 3).unwrap();
        acc.sync_vector(&mut a).unwrap();
        assert_eq!(acc.sync_vector(&mut b).unwrap_err().kind(), ErrorKind::NotBound);
    }

    #[test]
    fn clearing_a_unit_detaches_its_vector() {
        let acc = Accelerator::new();
        let mut a = ramp(16);
        let b = ramp(16);
        let mut c = ramp(16);
        acc.bind_to_unit(&mut a, 0).unwrap();
        acc.bind_to_unit(&mut c, 1).unwrap();
        acc.clear_unit(0).unwrap();
        assert_eq!(acc.sync_vector(&mut a).unwrap_err().kind(), ErrorKind::NotBound);
        assert_eq!(
            acc.execute_vectors(UnitOp::Add, &a, &mut c).unwrap_err().kind(),
            ErrorKind::NotBound
        );
        assert_eq!(
            acc.execute_vectors(UnitOp::Add, &b, &mut c).unwrap_err().kind(),
            ErrorKind::NotBound
        );
    }

    #[test]
    fn counters_advance_with_completed_ops() {
        let acc = Accelerator::new();
        assert_eq!(acc.status().stats.total_ops(), 0);

        let mut v = ramp(16);
        acc.bind_to_unit(&mut v, 0).unwrap();
        acc.execute(UnitOp::Copy, 0, 1).unwrap();
        acc.compute_vector(&v, VectorOp::Square);
        acc.convert_vector(&v, ConversionKind::Trinary);
        let h = acc.prepare(&Matrix::identity(16).unwrap());
        acc.compute_with_prepared(h, &v).unwrap();
        acc.compute_matrix_vector_multiply(&Matrix::identity(16).unwrap(), &v)
            .unwrap();

        // Failures are not counted.
        assert!(acc.execute(UnitOp::Add, 0, 200).is_err());
        assert!(acc.bind_to_unit(&mut v, 999).is_err());

        let stats = acc.status().stats;
        assert_eq!(stats.binds, 1);
        assert_eq!(stats.executes, 1);
        assert_eq!(stats.vector_ops, 1);
        assert_eq!(stats.conversions, 1);
        assert_eq!(stats.prepares, 1);
        assert_eq!(stats.products, 2);
        assert_eq!(stats.total_ops(), 7);
        assert!(stats.average_latency().is_some());
    }

    #[test]
    fn status_tracks_units() {
        let acc = Accelerator::new();
        acc.bind_to_unit(&mut ramp(16), 7).unwrap();
        acc.bind_to_unit(&mut ramp(16), 3).unwrap();
        let status = acc.status();
        assert_eq!(
            status.populated_units,
            vec![UnitId::new(3).unwrap(), UnitId::new(7).unwrap()]
        );
        assert_eq!(status.idle_count(), 254);
        assert!(acc.clear_unit(3).unwrap());
        assert!(!acc.clear_unit(3).unwrap());
        assert_eq!(acc.status().populated_count(), 1);
    }
}
