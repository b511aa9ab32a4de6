//! Object and robot records.
//!
//! An [`Object`] owns the DOF state of its kinematic structure: the base
//! coordinates, one position per joint, and one velocity per DOF. Base DOF
//! positions are kept as [`BaseCoordinates`] and the pose is rebuilt from
//! them on every write, so a base DOF reads back exactly what was written,
//! angles beyond `±π/2` included.

use nalgebra::DVector;
use sim_env_types::{
    BaseAxis, BaseCoordinates, DofInformation, EntityType, JointId, LinkId, ObjectId, ObjectState, Pose, Result,
    SimError, WorldId,
};

use crate::controller::SharedController;
use crate::entity::{check_dof_indices, Collidable, DofAddressable, Named, Posed, Target};

/// A registered object or robot.
#[derive(Debug, Clone)]
pub struct Object {
    id: ObjectId,
    name: String,
    world: WorldId,
    entity_type: EntityType,
    pose: Pose,
    base: BaseCoordinates,
    base_axes: Vec<BaseAxis>,
    links: Vec<LinkId>,
    joints: Vec<JointId>,
    base_link: LinkId,
    joint_positions: DVector<f64>,
    velocities: DVector<f64>,
    dof_info: Vec<DofInformation>,
    active_dofs: Vec<usize>,
    controller: Option<SharedController>,
}

impl Object {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: ObjectId,
        name: String,
        world: WorldId,
        entity_type: EntityType,
        pose: Pose,
        base_axes: Vec<BaseAxis>,
        base_link: LinkId,
        dof_info: Vec<DofInformation>,
    ) -> Self {
        let num_dofs = dof_info.len();
        let num_joints = num_dofs - base_axes.len();
        Self {
            id,
            name,
            world,
            entity_type,
            pose,
            base: BaseCoordinates::from_pose(&pose),
            base_axes,
            links: Vec::new(),
            joints: Vec::with_capacity(num_joints),
            base_link,
            joint_positions: DVector::zeros(num_joints),
            velocities: DVector::zeros(num_dofs),
            dof_info,
            active_dofs: (0..num_dofs).collect(),
            controller: None,
        }
    }

    /// Object id.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Whether this object is a robot.
    #[must_use]
    pub fn is_robot(&self) -> bool {
        self.entity_type == EntityType::Robot
    }

    /// Free base axes, in DOF order.
    #[must_use]
    pub fn base_axes(&self) -> &[BaseAxis] {
        &self.base_axes
    }

    /// Links of this object, in registration order.
    #[must_use]
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// Joints of this object, in joint-index order.
    #[must_use]
    pub fn joints(&self) -> &[JointId] {
        &self.joints
    }

    /// Number of joints.
    #[must_use]
    pub fn num_joints(&self) -> usize {
        self.joints.len()
    }

    /// Root of the kinematic tree.
    #[must_use]
    pub fn base_link(&self) -> LinkId {
        self.base_link
    }

    /// Joint with the given joint index.
    #[must_use]
    pub fn joint_by_index(&self, joint_index: usize) -> Option<JointId> {
        self.joints.get(joint_index).copied()
    }

    /// Joint that owns a DOF, or `None` for base DOFs and out-of-range
    /// indices.
    #[must_use]
    pub fn joint_from_dof_index(&self, dof_index: usize) -> Option<JointId> {
        dof_index
            .checked_sub(self.base_axes.len())
            .and_then(|i| self.joint_by_index(i))
    }

    /// Controller bound to this robot.
    #[must_use]
    pub fn controller(&self) -> Option<&SharedController> {
        self.controller.as_ref()
    }

    /// Complete snapshot of the object's state.
    #[must_use]
    pub fn state(&self) -> ObjectState {
        ObjectState::new(
            self.all_dof_positions(),
            self.velocities.clone(),
            self.pose,
            self.active_dofs.clone(),
        )
    }

    /// Check a snapshot against this object's dimensions.
    pub(crate) fn check_state(&self, state: &ObjectState) -> Result<()> {
        let num_dofs = self.num_dofs();
        if state.dof_positions.len() != num_dofs {
            return Err(SimError::dimension_mismatch(
                format!("{} state positions", self.name),
                num_dofs,
                state.dof_positions.len(),
            ));
        }
        if state.dof_velocities.len() != num_dofs {
            return Err(SimError::dimension_mismatch(
                format!("{} state velocities", self.name),
                num_dofs,
                state.dof_velocities.len(),
            ));
        }
        check_dof_indices(&state.active_dofs, num_dofs, true)?;
        if !state.pose.is_finite() {
            return Err(SimError::invalid_config(format!(
                "{} state pose is not finite",
                self.name
            )));
        }
        Ok(())
    }

    // =========================================================================
    // Mutation (reachable through a world transaction only)
    // =========================================================================

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn push_link(&mut self, link: LinkId) {
        self.links.push(link);
    }

    pub(crate) fn push_joint(&mut self, joint: JointId, position: f64) {
        let index = self.joints.len();
        self.joints.push(joint);
        if index < self.joint_positions.len() {
            self.joint_positions[index] = position;
        }
    }

    pub(crate) fn set_controller(&mut self, controller: Option<SharedController>) {
        self.controller = controller;
    }

    /// Move the base. Angles are taken from the decomposition of `pose`
    /// closest to the current coordinates.
    pub(crate) fn set_pose(&mut self, pose: Pose) {
        self.base = BaseCoordinates::from_pose_near(&pose, &self.base);
        self.pose = pose;
    }

    pub(crate) fn set_active_dofs(&mut self, indices: &[usize]) -> Result<()> {
        check_dof_indices(indices, self.num_dofs(), true)?;
        self.active_dofs = indices.to_vec();
        Ok(())
    }

    pub(crate) fn set_dof_positions(&mut self, values: &DVector<f64>, indices: &[usize]) -> Result<()> {
        let dofs = self.resolve_for_write(values.len(), indices, "dof positions")?;
        for (value, dof) in values.iter().zip(dofs) {
            self.write_position(dof, *value);
        }
        Ok(())
    }

    pub(crate) fn set_dof_velocities(&mut self, values: &DVector<f64>, indices: &[usize]) -> Result<()> {
        let dofs = self.resolve_for_write(values.len(), indices, "dof velocities")?;
        for (value, dof) in values.iter().zip(dofs) {
            self.velocities[dof] = *value;
        }
        Ok(())
    }

    /// Apply a snapshot. The pose is applied as is; the base entries of
    /// `dof_positions` select which of its equivalent coordinates the base
    /// DOFs report.
    pub(crate) fn set_state(&mut self, state: &ObjectState) -> Result<()> {
        self.check_state(state)?;
        let k = self.base_axes.len();
        let mut near = self.base;
        for (axis, value) in self.base_axes.iter().zip(state.dof_positions.iter()) {
            near.set(*axis, *value);
        }
        self.base = BaseCoordinates::from_pose_near(&state.pose, &near);
        for (axis, value) in self.base_axes.iter().zip(state.dof_positions.iter()) {
            self.base.set(*axis, *value);
        }
        self.pose = state.pose;
        self.joint_positions = state.dof_positions.rows(k, self.joints.len()).into_owned();
        self.velocities = state.dof_velocities.clone();
        self.active_dofs = state.active_dofs.clone();
        Ok(())
    }

    /// Overwrite every DOF position (index order). Used by backends while integrating.
    /// Unchanged entries are not written, so a resting base keeps its exact
    /// pose.
    pub(crate) fn set_all_positions(&mut self, positions: &DVector<f64>) {
        for (dof, value) in positions.iter().enumerate().take(self.num_dofs()) {
            if self.dof_position(dof) != Some(*value) {
                self.write_position(dof, *value);
            }
        }
    }

    /// Overwrite every DOF velocity (index order). Used by backends while integrating.
    pub(crate) fn set_all_velocities(&mut self, velocities: &DVector<f64>) {
        if velocities.len() == self.velocities.len() {
            self.velocities.copy_from(velocities);
        }
    }

    fn resolve_for_write(&self, len: usize, indices: &[usize], what: &str) -> Result<Vec<usize>> {
        let dofs = if indices.is_empty() {
            self.active_dofs.clone()
        } else {
            check_dof_indices(indices, self.num_dofs(), true)?;
            indices.to_vec()
        };
        if dofs.len() != len {
            return Err(SimError::dimension_mismatch(
                format!("{} {what}", self.name),
                dofs.len(),
                len,
            ));
        }
        Ok(dofs)
    }

    fn write_position(&mut self, dof: usize, value: f64) {
        let k = self.base_axes.len();
        if let Some(&axis) = self.base_axes.get(dof) {
            self.base.set(axis, value);
            if axis.is_rotational() {
                self.pose.rotation = self.base.to_pose().rotation;
            } else {
                self.pose.position = self.base.position();
            }
        } else if dof - k < self.joint_positions.len() {
            self.joint_positions[dof - k] = value;
        }
    }
}

impl Named for Object {
    fn name(&self) -> &str {
        &self.name
    }

    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn world_id(&self) -> WorldId {
        self.world
    }
}

impl Posed for Object {
    fn transform(&self) -> Pose {
        self.pose
    }
}

impl Collidable for Object {
    fn collision_target(&self) -> Target {
        Target::Object(self.id)
    }
}

impl DofAddressable for Object {
    fn num_base_dofs(&self) -> usize {
        self.base_axes.len()
    }

    fn num_dofs(&self) -> usize {
        self.dof_info.len()
    }

    fn active_dofs(&self) -> &[usize] {
        &self.active_dofs
    }

    fn dof_position(&self, index: usize) -> Option<f64> {
        let k = self.base_axes.len();
        match self.base_axes.get(index) {
            Some(&axis) => Some(self.base.get(axis)),
            None => self.joint_positions.get(index.checked_sub(k)?).copied(),
        }
    }

    fn dof_velocity(&self, index: usize) -> Option<f64> {
        self.velocities.get(index).copied()
    }

    fn dof_information(&self, index: usize) -> Option<DofInformation> {
        self.dof_info.get(index).copied()
    }

    fn all_dof_velocities(&self) -> DVector<f64> {
        self.velocities.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use sim_env_types::DofLimits;

    /// Planar base (x, y, yaw) plus two joints.
    fn mobile_arm() -> Object {
        let axes = BaseAxis::PLANAR.to_vec();
        let dof_info = (0..5)
            .map(|i| {
                let rotational = i == 2 || i >= 3;
                DofInformation::new(i, DofLimits::unlimited().with_velocity(1.0), rotational)
            })
            .collect();
        let mut object = Object::new(
            ObjectId(1),
            "mobile".into(),
            WorldId(0),
            EntityType::Robot,
            Pose::identity(),
            axes,
            LinkId(10),
            dof_info,
        );
        object.push_joint(JointId(20), 0.25);
        object.push_joint(JointId(21), -0.5);
        object
    }

    #[test]
    fn test_dof_layout() {
        let object = mobile_arm();
        assert_eq!(object.num_dofs(), 5);
        assert_eq!(object.num_base_dofs(), 3);
        assert!(!object.is_static());
        assert_eq!(object.dof_indices(), vec![0, 1, 2, 3, 4]);
        assert_eq!(object.joint_from_dof_index(3), Some(JointId(20)));
        assert_eq!(object.joint_from_dof_index(4), Some(JointId(21)));
        assert_eq!(object.joint_from_dof_index(2), None);
        assert_eq!(object.joint_from_dof_index(5), None);
    }

    #[test]
    fn test_positions_follow_index_order() {
        let object = mobile_arm();
        let p = object.dof_positions(&[4, 3]).unwrap();
        assert_eq!(p.as_slice(), &[-0.5, 0.25]);
    }

    #[test]
    fn test_base_positions_write_through_pose() {
        let mut object = mobile_arm();
        object
            .set_dof_positions(&DVector::from_vec(vec![1.0, 2.0, 0.5]), &[0, 1, 2])
            .unwrap();
        assert_relative_eq!(object.transform().position.x, 1.0);
        assert_relative_eq!(object.transform().position.y, 2.0);
        assert_relative_eq!(object.transform().rpy().2, 0.5, epsilon = 1e-12);
        assert_relative_eq!(object.dof_position(2).unwrap(), 0.5, epsilon = 1e-12);
    }

    /// Free-floating body with all six base axes.
    fn free_body() -> Object {
        let dof_info = BaseAxis::ALL
            .iter()
            .enumerate()
            .map(|(i, axis)| DofInformation::new(i, DofLimits::unlimited(), axis.is_rotational()))
            .collect();
        Object::new(
            ObjectId(2),
            "free".into(),
            WorldId(0),
            EntityType::Object,
            Pose::identity(),
            BaseAxis::ALL.to_vec(),
            LinkId(30),
            dof_info,
        )
    }

    #[test]
    fn test_steep_base_angles_read_back_as_written() {
        let mut object = free_body();
        let written = DVector::from_vec(vec![0.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
        object.set_dof_positions(&written, &[]).unwrap();
        assert_eq!(object.all_dof_positions(), written);

        // Writing one axis leaves the others alone.
        object
            .set_dof_positions(&DVector::from_vec(vec![3.5]), &[5])
            .unwrap();
        assert_eq!(object.dof_position(3), Some(0.0));
        assert_eq!(object.dof_position(4), Some(2.0));
        assert_eq!(object.dof_position(5), Some(3.5));
        let expected = UnitQuaternion::from_euler_angles(0.0, 2.0, 3.5);
        assert_eq!(object.transform().rotation, expected);
    }

    #[test]
    fn test_set_pose_keeps_nearest_coordinates() {
        let mut object = free_body();
        object
            .set_dof_positions(&DVector::from_vec(vec![2.0]), &[4])
            .unwrap();
        let pose = object.transform();
        object.set_pose(pose);
        assert_relative_eq!(object.dof_position(3).unwrap(), 0.0, epsilon = 1e-9);
        assert_relative_eq!(object.dof_position(4).unwrap(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(object.dof_position(5).unwrap(), 0.0, epsilon = 1e-9);

        let state = object.state();
        let mut other = free_body();
        other.set_state(&state).unwrap();
        assert_eq!(other.state(), state);
    }

    #[test]
    fn test_write_rejects_duplicates_and_length() {
        let mut object = mobile_arm();
        let err = object
            .set_dof_positions(&DVector::from_vec(vec![1.0, 2.0]), &[3, 3])
            .unwrap_err();
        assert_eq!(err, SimError::DuplicateDofIndex { index: 3 });

        let err = object
            .set_dof_velocities(&DVector::from_vec(vec![1.0]), &[3, 4])
            .unwrap_err();
        assert!(matches!(err, SimError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_active_dofs_replaced_atomically() {
        let mut object = mobile_arm();
        assert!(object.set_active_dofs(&[4, 1, 9]).is_err());
        assert_eq!(object.active_dofs(), &[0, 1, 2, 3, 4]);

        object.set_active_dofs(&[4, 1]).unwrap();
        assert_eq!(object.active_dofs(), &[4, 1]);
        assert_eq!(
            object.dof_positions(&[]).unwrap(),
            object.dof_positions(&[4, 1]).unwrap()
        );
    }

    #[test]
    fn test_state_round_trip() {
        let mut object = mobile_arm();
        object
            .set_dof_velocities(&DVector::from_vec(vec![0.1, 0.2, 0.3, 0.4, 0.5]), &[])
            .unwrap();
        let before = object.state();
        object.set_state(&before).unwrap();
        assert_eq!(object.state(), before);
    }

    #[test]
    fn test_state_rejects_wrong_dimensions() {
        let mut object = mobile_arm();
        let mut state = object.state();
        state.dof_velocities = DVector::zeros(2);
        assert!(object.set_state(&state).is_err());
    }
}
