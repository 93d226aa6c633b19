//! Forward kinematics for the robot arm sketch.
//!
//! The arm is a chain of joint groups. Each group sits at a fixed offset inside its
//! parent and rotates with Euler angles applied in X, Y, Z order. The boxes that make
//! up the arm hang off these groups as [`Segment`]s.

use cgmath::{Quaternion, Rad, Rotation3, Vector3};

use crate::data_structures::instance::Instance;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Joint {
    Shoulder,
    Elbow,
    Forearm,
    Wrist,
    Hand,
}

impl Joint {
    pub const ALL: [Joint; 5] = [
        Joint::Shoulder,
        Joint::Elbow,
        Joint::Forearm,
        Joint::Wrist,
        Joint::Hand,
    ];

    /// Offset of this group inside its parent group (the shoulder's parent is the world).
    pub fn offset(self) -> Vector3<f32> {
        match self {
            Joint::Shoulder => Vector3::new(0.0, 2.4, 0.0),
            Joint::Elbow => Vector3::new(0.0, -2.4, 0.0),
            Joint::Forearm => Vector3::new(0.0, -1.2, 0.0),
            Joint::Wrist => Vector3::new(0.0, -1.2, 0.0),
            Joint::Hand => Vector3::new(0.0, -0.6, 0.0),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// One adjustable angle with its limits in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Control {
    pub name: &'static str,
    pub joint: Joint,
    pub axis: Axis,
    pub min: f32,
    pub max: f32,
}

pub const CONTROLS: [Control; 7] = [
    Control { name: "shoulder x", joint: Joint::Shoulder, axis: Axis::X, min: -1.5, max: 1.5 },
    Control { name: "shoulder z", joint: Joint::Shoulder, axis: Axis::Z, min: -1.6, max: 1.6 },
    Control { name: "elbow x", joint: Joint::Elbow, axis: Axis::X, min: -1.0, max: 0.0 },
    Control { name: "forearm y", joint: Joint::Forearm, axis: Axis::Y, min: 0.0, max: 1.0 },
    Control { name: "wrist x", joint: Joint::Wrist, axis: Axis::X, min: -0.45, max: 0.45 },
    Control { name: "hand x", joint: Joint::Hand, axis: Axis::X, min: -0.3, max: 0.3 },
    Control { name: "hand z", joint: Joint::Hand, axis: Axis::Z, min: -0.3, max: 0.3 },
];

/// A box attached to a joint group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub joint: Joint,
    pub size: Vector3<f32>,
    pub offset: Vector3<f32>,
}

const JOINT_CUBE: f32 = 0.5;

pub const SEGMENTS: [Segment; 6] = [
    Segment { joint: Joint::Shoulder, size: Vector3::new(JOINT_CUBE, JOINT_CUBE, JOINT_CUBE), offset: Vector3::new(0.0, 0.0, 0.0) },
    Segment { joint: Joint::Shoulder, size: Vector3::new(0.8, 2.0, 0.8), offset: Vector3::new(0.0, -1.2, 0.0) },
    Segment { joint: Joint::Elbow, size: Vector3::new(JOINT_CUBE, JOINT_CUBE, JOINT_CUBE), offset: Vector3::new(0.0, 0.0, 0.0) },
    Segment { joint: Joint::Forearm, size: Vector3::new(0.8, 2.0, 0.8), offset: Vector3::new(0.0, 0.0, 0.0) },
    Segment { joint: Joint::Wrist, size: Vector3::new(JOINT_CUBE, JOINT_CUBE, JOINT_CUBE), offset: Vector3::new(0.0, 0.0, 0.0) },
    Segment { joint: Joint::Hand, size: Vector3::new(0.7, 0.7, 0.9), offset: Vector3::new(0.0, 0.0, 0.0) },
];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RobotArm {
    // Euler angles per joint, indexed by `Joint as usize`
    angles: [[f32; 3]; 5],
}

impl RobotArm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controls(&self) -> &'static [Control] {
        &CONTROLS
    }

    pub fn get(&self, control: &Control) -> f32 {
        self.angles[control.joint.index()][control.axis as usize]
    }

    /// Sets an angle, clamped to the control's limits. Returns the applied value.
    pub fn set(&mut self, control: &Control, value: f32) -> f32 {
        let value = value.clamp(control.min, control.max);
        self.angles[control.joint.index()][control.axis as usize] = value;
        value
    }

    pub fn nudge(&mut self, control: &Control, delta: f32) -> f32 {
        self.set(control, self.get(control) + delta)
    }

    pub fn rotation(&self, joint: Joint) -> Quaternion<f32> {
        let [x, y, z] = self.angles[joint.index()];
        Quaternion::from_angle_x(Rad(x)) * Quaternion::from_angle_y(Rad(y)) * Quaternion::from_angle_z(Rad(z))
    }

    /// Each joint group's transform relative to its parent group.
    pub fn local_transforms(&self) -> [Instance; 5] {
        Joint::ALL.map(|joint| Instance::from(joint.offset()).with_rotation(self.rotation(joint)))
    }

    /// Joint group transforms in world space, shoulder first.
    pub fn world_transforms(&self) -> [Instance; 5] {
        let locals = self.local_transforms();
        let mut worlds: [Instance; 5] = Default::default();
        let mut parent = Instance::new();
        for (world, local) in worlds.iter_mut().zip(locals.iter()) {
            *world = &parent * local;
            parent = world.clone();
        }
        worlds
    }

    pub fn hand_position(&self) -> Vector3<f32> {
        self.world_transforms()[Joint::Hand.index()].position
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_2;

    use cgmath::InnerSpace;

    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    fn control(name: &str) -> Control {
        *CONTROLS.iter().find(|c| c.name == name).unwrap()
    }

    #[test]
    fn rest_pose_hangs_straight_down() {
        let arm = RobotArm::new();
        assert!(close(arm.hand_position(), Vector3::new(0.0, -3.0, 0.0)));
        let elbow = arm.world_transforms()[Joint::Elbow as usize].position;
        assert!(close(elbow, Vector3::new(0.0, 0.0, 0.0)));
    }

    #[test]
    fn shoulder_z_swings_the_whole_chain() {
        let mut arm = RobotArm::new();
        arm.set(&control("shoulder z"), FRAC_PI_2 - 0.1);
        let angle = FRAC_PI_2 - 0.1;
        // the chain below the shoulder is 5.4 long and rotates about z
        let expected = Vector3::new(5.4 * angle.sin(), 2.4 - 5.4 * angle.cos(), 0.0);
        assert!(close(arm.hand_position(), expected));
    }

    #[test]
    fn elbow_bends_only_the_lower_chain() {
        let mut arm = RobotArm::new();
        arm.set(&control("elbow x"), -1.0);
        let worlds = arm.world_transforms();
        assert!(close(worlds[Joint::Elbow as usize].position, Vector3::new(0.0, 0.0, 0.0)));
        // 3.0 below the elbow, tilted by -1 rad about x: y = -3cos(1), z = -3sin(1)
        let expected = Vector3::new(0.0, -3.0 * 1.0f32.cos(), -3.0 * 1.0f32.sin());
        assert!(close(arm.hand_position(), expected));
    }

    #[test]
    fn forearm_twist_keeps_the_hand_on_axis() {
        let mut arm = RobotArm::new();
        arm.set(&control("forearm y"), 1.0);
        assert!(close(arm.hand_position(), Vector3::new(0.0, -3.0, 0.0)));
    }

    #[test]
    fn angles_are_clamped_to_limits() {
        let mut arm = RobotArm::new();
        assert_eq!(arm.set(&control("elbow x"), 0.5), 0.0);
        assert_eq!(arm.set(&control("shoulder x"), -9.0), -1.5);
        assert_eq!(arm.nudge(&control("wrist x"), 0.3), 0.3);
        assert_eq!(arm.nudge(&control("wrist x"), 0.3), 0.45);
        assert_eq!(arm.get(&control("wrist x")), 0.45);
    }

    #[test]
    fn every_control_starts_inside_its_range() {
        let arm = RobotArm::new();
        for c in arm.controls() {
            let v = arm.get(c);
            assert!(v >= c.min && v <= c.max, "{} out of range", c.name);
        }
    }
}
