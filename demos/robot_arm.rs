use flow_sketches::{Demo, run_demo};

fn main() -> anyhow::Result<()> {
    run_demo(Demo::RobotArm)
}
